// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Accessors to the array of values in element value by the type of value.

use {
    super::*,
    alsactl::{prelude::*, ElemValue},
    glib::prelude::IsA,
};

pub trait ElemValueAccessor<T>: IsA<ElemValue>
where
    T: Copy + Clone + Default + Eq + PartialEq,
{
    fn set(&self, vals: &[T]);
    fn get<F>(&self, len: usize, cb: F) -> Result<(), Error>
    where
        F: FnMut(&[T]) -> Result<(), Error>;

    /// Fill the first values by the callback with the index of value.
    fn set_vals<F>(&self, len: usize, mut cb: F) -> Result<(), Error>
    where
        F: FnMut(usize) -> Result<T, Error>,
    {
        self.get(len, |prev| {
            let mut vals = prev.to_owned();
            vals.iter_mut()
                .enumerate()
                .try_for_each(|(ch, v)| cb(ch).map(|val| *v = val))
                .map(|_| self.set(&vals))
        })
    }

    /// Call the callback for each value changed from the old one.
    fn get_vals<F>(&self, old: &Self, len: usize, mut cb: F) -> Result<(), Error>
    where
        F: FnMut(usize, T) -> Result<(), Error>,
    {
        self.get(len, |curr| {
            old.get(len, |prev| {
                curr.iter()
                    .zip(prev)
                    .enumerate()
                    .filter(|(_, (n, o))| !n.eq(o))
                    .try_for_each(|(ch, (v, _))| cb(ch, *v))
            })
        })
    }

    fn set_val<F>(&self, mut cb: F) -> Result<(), Error>
    where
        F: FnMut() -> Result<T, Error>,
    {
        cb().map(|val| self.set(&[val]))
    }

    fn get_val<F>(&self, mut cb: F) -> Result<(), Error>
    where
        F: FnMut(T) -> Result<(), Error>,
    {
        self.get(1, |vals| cb(vals[0]))
    }
}

impl ElemValueAccessor<bool> for ElemValue {
    fn set(&self, vals: &[bool]) {
        self.set_bool(vals)
    }

    fn get<F>(&self, len: usize, mut cb: F) -> Result<(), Error>
    where
        F: FnMut(&[bool]) -> Result<(), Error>,
    {
        cb(&self.boolean()[..len])
    }
}

impl ElemValueAccessor<i32> for ElemValue {
    fn set(&self, vals: &[i32]) {
        self.set_int(vals)
    }

    fn get<F>(&self, len: usize, mut cb: F) -> Result<(), Error>
    where
        F: FnMut(&[i32]) -> Result<(), Error>,
    {
        cb(&self.int()[..len])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn int_accessor() {
        let elem_value = ElemValue::new();
        ElemValueAccessor::<i32>::set_val(&elem_value, || Ok(0x0c)).unwrap();
        assert_eq!(elem_value.int()[0], 0x0c);

        let mut val = 0;
        ElemValueAccessor::<i32>::get_val(&elem_value, |v| {
            val = v;
            Ok(())
        })
        .unwrap();
        assert_eq!(val, 0x0c);
    }

    #[test]
    fn changed_values() {
        let old = ElemValue::new();
        ElemValueAccessor::<bool>::set_vals(&old, 3, |_| Ok(false)).unwrap();

        let new = ElemValue::new();
        ElemValueAccessor::<bool>::set_vals(&new, 3, |ch| Ok(ch == 1)).unwrap();

        let mut changed = Vec::new();
        ElemValueAccessor::<bool>::get_vals(&new, &old, 3, |ch, v| {
            changed.push((ch, v));
            Ok(())
        })
        .unwrap();
        assert_eq!(changed, vec![(1, true)]);
    }
}
