use midir::{Ignore, MidiInput, MidiInputPort as MidiInputPortHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use stickwork_ports::midi::{
    MidiError, MidiInputPort, MidiInputStream, MidiMessageKind, PlayerEvent, PlayerEventCallback,
};
use stickwork_ports::types::{DeviceId, MidiInputDevice};

mod parse;

pub use parse::parse_message;

/// Live MIDI input through midir.
///
/// Event timestamps are milliseconds since `origin`; the host must use the
/// same origin for playback position notifications.
pub struct MidirMidiInputPort {
    client_name: String,
    origin: Instant,
    next_id: Arc<AtomicU64>,
}

impl MidirMidiInputPort {
    pub fn new(client_name: impl Into<String>, origin: Instant) -> Self {
        Self {
            client_name: client_name.into(),
            origin,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn create_midi_in(&self) -> Result<MidiInput, MidiError> {
        MidiInput::new(&self.client_name).map_err(|e| MidiError::Backend(e.to_string()))
    }
}

/// Input ports with the ids the host sees. Ids embed the enumeration index
/// so two devices with the same name stay distinct.
fn scan_ports(midi_in: &MidiInput) -> Vec<(DeviceId, String, MidiInputPortHandle)> {
    midi_in
        .ports()
        .into_iter()
        .enumerate()
        .map(|(index, port)| {
            let name = midi_in
                .port_name(&port)
                .unwrap_or_else(|_| "Unknown Input".to_string());
            (DeviceId(format!("midir:{index}:{name}")), name, port)
        })
        .collect()
}

impl Default for MidirMidiInputPort {
    fn default() -> Self {
        Self::new("Stickwork", Instant::now())
    }
}

pub struct MidirMidiInputStream {
    connection: Option<midir::MidiInputConnection<PlayerEventCallback>>,
}

impl MidiInputStream for MidirMidiInputStream {
    fn close(mut self: Box<Self>) {
        if let Some(connection) = self.connection.take() {
            let _ = connection.close();
        }
    }
}

impl MidiInputPort for MidirMidiInputPort {
    fn list_inputs(&self) -> Result<Vec<MidiInputDevice>, MidiError> {
        let midi_in = self.create_midi_in()?;
        let devices: Vec<MidiInputDevice> = scan_ports(&midi_in)
            .into_iter()
            .map(|(id, name, _)| MidiInputDevice {
                id,
                name,
                // midir does not report vendors
                manufacturer: String::new(),
                is_available: true,
            })
            .collect();

        log::debug!("found {} midi inputs", devices.len());
        Ok(devices)
    }

    fn open_input(
        &self,
        device_id: &DeviceId,
        cb: PlayerEventCallback,
    ) -> Result<Box<dyn MidiInputStream>, MidiError> {
        let mut midi_in = self.create_midi_in()?;
        midi_in.ignore(Ignore::All);

        let port = scan_ports(&midi_in)
            .into_iter()
            .find_map(|(id, _, port)| (&id == device_id).then_some(port))
            .ok_or_else(|| MidiError::DeviceNotFound(device_id.to_string()))?;

        let origin = self.origin;
        let next_id = Arc::clone(&self.next_id);
        let connection = midi_in
            .connect(
                &port,
                "stickwork-midi-input",
                move |_stamp, raw, callback| {
                    let Some(message) = parse_message(raw) else {
                        return;
                    };
                    if message.kind == MidiMessageKind::Unknown {
                        return;
                    }
                    let player_event = PlayerEvent {
                        id: next_id.fetch_add(1, Ordering::Relaxed),
                        timestamp_ms: origin.elapsed().as_secs_f64() * 1000.0,
                        message,
                    };
                    (callback)(player_event);
                },
                cb,
            )
            .map_err(|e| MidiError::Backend(e.to_string()))?;

        log::info!("midi input opened: {device_id}");
        Ok(Box::new(MidirMidiInputStream {
            connection: Some(connection),
        }))
    }
}
