// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Runtime to route physical audio devices by mixer controls of sound card, according to the
//! route configuration of board.
//!
//! The runtime adds user-defined control elements to the sound card so that the other process
//! can switch the output and input devices.

mod card_mixer;
mod route_ctl;

pub use card_mixer::CardMixer;

use {
    alsactl::{prelude::*, *},
    glib::{ControlFlow, Error, FileError},
    nix::sys::signal,
    route_ctl::*,
    runtime_core::{card_cntr::*, dispatcher::*, elem_value_accessor::*, *},
    std::sync::mpsc,
    tinyhal_route_protocols::{
        config::*, ctl::*, hal::*, mask::*, route::*, switch::*, RouteError,
    },
    tracing::{debug, debug_span, warn},
};

/// The parameters of runtime.
#[derive(Debug, Clone)]
pub struct TinyhalParams {
    /// The numeric identifier of sound card in Linux sound subsystem.
    pub card_id: u32,
    /// The location of route configuration.
    pub source: RouteSource,
}

enum Event {
    Shutdown,
    Disconnected,
    Elem(ElemId, ElemEventMask),
}

pub struct TinyhalRuntime {
    device: AudioHwDevice<CardMixer>,
    model: RouteCtl,
    card_cntr: CardCntr,
    rx: mpsc::Receiver<Event>,
    tx: mpsc::SyncSender<Event>,
    dispatchers: Vec<Dispatcher>,
}

impl Drop for TinyhalRuntime {
    fn drop(&mut self) {
        // At first, stop event loop in all of dispatchers to avoid queueing new events.
        for dispatcher in &mut self.dispatchers {
            dispatcher.stop();
        }

        // Next, consume all events in queue to release blocked thread for sender.
        for _ in self.rx.try_iter() {}

        // Finally Finish I/O threads.
        self.dispatchers.clear();
    }
}

impl RuntimeOperation<TinyhalParams> for TinyhalRuntime {
    fn new(params: TinyhalParams, log_level: Option<LogLevel>) -> Result<Self, Error> {
        init_tracing(log_level);

        let path = params.source.path();
        debug!(card_id = params.card_id, config = ?path);

        let mixer = CardMixer::open(params.card_id)?;
        let device = AudioHwDevice::open(mixer, &params.source)?;

        let card_cntr = CardCntr::default();
        card_cntr.card.open(params.card_id, 0)?;

        // Use uni-directional channel for communication to child threads.
        let (tx, rx) = mpsc::sync_channel(32);

        Ok(TinyhalRuntime {
            device,
            model: Default::default(),
            card_cntr,
            rx,
            tx,
            dispatchers: Default::default(),
        })
    }

    fn listen(&mut self) -> Result<(), Error> {
        self.launch_system_event_dispatcher()?;

        let enter = debug_span!("cache").entered();
        self.model.cache(&mut self.device)?;
        enter.exit();

        let enter = debug_span!("load").entered();
        CtlModel::<AudioHwDevice<CardMixer>>::load(&mut self.model, &mut self.card_cntr)?;
        let elem_id_list = self.model.elem_id_list.clone();
        self.card_cntr
            .update_elems(&mut self.device, &elem_id_list, &mut self.model)?;
        enter.exit();

        Ok(())
    }

    fn run(&mut self) -> Result<(), Error> {
        let enter = debug_span!("event").entered();

        while let Ok(ev) = self.rx.recv() {
            match ev {
                Event::Shutdown | Event::Disconnected => break,
                Event::Elem(elem_id, events) => {
                    let _enter = debug_span!("element").entered();

                    debug!(
                        numid = elem_id.numid(),
                        name = elem_id.name().as_str(),
                        iface = ?elem_id.iface(),
                        device_id = elem_id.device_id(),
                        subdevice_id = elem_id.subdevice_id(),
                        index = elem_id.index(),
                    );

                    if let Err(e) = self.card_cntr.dispatch_elem_event(
                        &mut self.device,
                        &elem_id,
                        &events,
                        &mut self.model,
                    ) {
                        warn!("{}", e);
                    }

                    // The state of the other elements can be changed by the switch.
                    let elem_id_list = self.model.elem_id_list.clone();
                    if let Err(e) = self.card_cntr.update_elems(
                        &mut self.device,
                        &elem_id_list,
                        &mut self.model,
                    ) {
                        warn!("{}", e);
                    }
                }
            }
        }

        enter.exit();

        Ok(())
    }
}

const SYSTEM_DISPATCHER_NAME: &str = "system event dispatcher";

impl TinyhalRuntime {
    fn launch_system_event_dispatcher(&mut self) -> Result<(), Error> {
        let name = SYSTEM_DISPATCHER_NAME.to_string();
        let mut dispatcher = Dispatcher::run(name)?;

        let tx = self.tx.clone();
        dispatcher.attach_signal_handler(signal::Signal::SIGINT, move || {
            let _ = tx.send(Event::Shutdown);
            ControlFlow::Break
        });

        let tx = self.tx.clone();
        dispatcher.attach_snd_card(&self.card_cntr.card, move |_| {
            let _ = tx.send(Event::Disconnected);
        })?;

        let tx = self.tx.clone();
        self.card_cntr
            .card
            .connect_handle_elem_event(move |_, elem_id, events| {
                let elem_id: ElemId = elem_id.clone();
                let _ = tx.send(Event::Elem(elem_id, events));
            });

        self.dispatchers.push(dispatcher);

        Ok(())
    }
}
