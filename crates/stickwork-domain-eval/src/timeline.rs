use crate::grading::Grade;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use stickwork_domain_score::ExpectedNote;
use stickwork_ports::types::Millis;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub grade: Grade,
    pub time_ms: Millis,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoteSlot {
    pub note: ExpectedNote,
    resolution: Option<Resolution>,
}

impl NoteSlot {
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }
}

/// Authoritative store of expected notes for one loaded score.
///
/// Order is fixed at construction. A slot's resolution is written at most
/// once between resets, and only through [`NoteTimeline::resolve`].
#[derive(Clone, Debug, Default)]
pub struct NoteTimeline {
    slots: Vec<NoteSlot>,
    by_id: HashMap<String, usize>,
}

impl NoteTimeline {
    pub fn new(notes: Vec<ExpectedNote>) -> Self {
        let by_id = notes
            .iter()
            .enumerate()
            .map(|(idx, note)| (note.id.clone(), idx))
            .collect();
        let slots = notes
            .into_iter()
            .map(|note| NoteSlot {
                note,
                resolution: None,
            })
            .collect();
        Self { slots, by_id }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[NoteSlot] {
        &self.slots
    }

    pub fn get(&self, idx: usize) -> Option<&NoteSlot> {
        self.slots.get(idx)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn by_id(&self, id: &str) -> Option<&NoteSlot> {
        self.position(id).and_then(|idx| self.slots.get(idx))
    }

    pub fn pending(&self) -> impl Iterator<Item = (usize, &NoteSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_resolved())
    }

    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_resolved()).count()
    }

    /// Marks a note resolved. Returns the note only on the first call for
    /// that slot; an already resolved slot is left untouched.
    pub fn resolve(&mut self, idx: usize, grade: Grade, time_ms: Millis) -> Option<&ExpectedNote> {
        let slot = self.slots.get_mut(idx)?;
        if slot.resolution.is_some() {
            return None;
        }
        slot.resolution = Some(Resolution { grade, time_ms });
        Some(&slot.note)
    }

    /// Clears every resolution and returns the notes that had one.
    pub fn reset(&mut self) -> Vec<ExpectedNote> {
        let mut cleared = Vec::new();
        for slot in &mut self.slots {
            if slot.resolution.take().is_some() {
                cleared.push(slot.note.clone());
            }
        }
        cleared
    }
}
