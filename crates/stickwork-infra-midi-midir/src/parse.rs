use stickwork_ports::midi::{MidiMessage, MidiMessageKind};

/// Decodes a raw channel message. Returns `None` only for an empty buffer;
/// truncated messages keep whatever fields they carry.
pub fn parse_message(raw: &[u8]) -> Option<MidiMessage> {
    let (&status, data) = raw.split_first()?;
    let note = data.first().copied();
    let velocity = data.get(1).copied();

    let kind = match status & 0xF0 {
        0x80 => MidiMessageKind::NoteOff,
        0x90 => match velocity {
            Some(v) if v > 0 => MidiMessageKind::NoteOn,
            _ => MidiMessageKind::NoteOff,
        },
        0xB0 => MidiMessageKind::ControlChange,
        _ => MidiMessageKind::Unknown,
    };

    Some(MidiMessage {
        kind,
        note,
        velocity,
        channel: status & 0x0F,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn note_on_carries_channel() {
        assert_eq!(
            parse_message(&[0x99, 38, 100]),
            Some(MidiMessage {
                kind: MidiMessageKind::NoteOn,
                note: Some(38),
                velocity: Some(100),
                channel: 9,
            })
        );
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        let msg = parse_message(&[0x90, 36, 0]).expect("message");
        assert_eq!(msg.kind, MidiMessageKind::NoteOff);
        assert_eq!(msg.struck_note(), None);
    }

    #[test]
    fn explicit_note_off() {
        let msg = parse_message(&[0x82, 42, 64]).expect("message");
        assert_eq!(msg.kind, MidiMessageKind::NoteOff);
        assert_eq!(msg.channel, 2);
    }

    #[test]
    fn control_change_and_unknown() {
        assert_eq!(
            parse_message(&[0xB9, 4, 127]).map(|m| m.kind),
            Some(MidiMessageKind::ControlChange)
        );
        assert_eq!(
            parse_message(&[0xE0, 0, 64]).map(|m| m.kind),
            Some(MidiMessageKind::Unknown)
        );
    }

    #[test]
    fn truncated_messages_leave_fields_absent() {
        let msg = parse_message(&[0x99, 38]).expect("message");
        assert_eq!(msg.note, Some(38));
        assert_eq!(msg.velocity, None);
        assert_eq!(msg.kind, MidiMessageKind::NoteOff);

        let msg = parse_message(&[0x99]).expect("message");
        assert_eq!(msg.note, None);
        assert_eq!(parse_message(&[]), None);
    }
}
