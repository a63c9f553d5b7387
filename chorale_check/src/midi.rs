// MIDI input: four voices chordified into vertical slices.
//
// Reads a Standard MIDI File with `midly` and collects the notes of each
// voice. Voices come from the first four tracks that contain notes, soprano
// first. A file whose notes all live in one track (format 0, or a format 1
// file written that way) is split by channel instead: channels 0-3 are
// soprano, alto, tenor and bass.
//
// Chordifying cuts the texture at every note onset of any voice. Each slice
// records the key number sounding in every voice at that moment and how
// long the slice lasts until the next onset. Slices where every voice rests
// are skipped; a slice where only some voices sound cannot be checked as a
// four-part chord and is rejected.
//
// Pitch spelling happens later, once the key is known.

use crate::chord::VOICE_COUNT;
use crate::error::{Error, PreprocessingError, Result};
use midly::{MidiMessage, Smf, TrackEventKind};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// A sounding note in absolute ticks, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiNote {
    pub key: u8,
    pub start: u64,
    pub end: u64,
}

/// One chordified moment: the key number of each voice, soprano first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub onset: u64,
    pub duration: u64,
    pub keys: [u8; VOICE_COUNT],
}

/// Parse a MIDI file and chordify its four voices.
pub fn read_slices(bytes: &[u8]) -> Result<Vec<Slice>> {
    let voices = read_voices(bytes)?;
    chordify(&voices)
}

/// Parse a MIDI file into four note lists, soprano first.
pub fn read_voices(bytes: &[u8]) -> Result<Vec<Vec<MidiNote>>> {
    let smf = Smf::parse(bytes).map_err(PreprocessingError::from)?;

    // Notes per track, each tagged with its channel.
    let mut tracks: Vec<Vec<(u8, MidiNote)>> = Vec::new();
    for track in &smf.tracks {
        let notes = collect_track_notes(track);
        if !notes.is_empty() {
            tracks.push(notes);
        }
    }
    debug!(tracks = tracks.len(), "MIDI tracks with notes");

    let voices: Vec<Vec<MidiNote>> = match tracks.len() {
        0 => return Err(PreprocessingError::EmptyScore.into()),
        1 => {
            let notes = &tracks[0];
            let channels: BTreeSet<u8> = notes.iter().map(|(ch, _)| *ch).collect();
            if let Some(extra) = channels.iter().find(|&&ch| ch as usize >= VOICE_COUNT) {
                return Err(PreprocessingError::VoiceLayout(format!(
                    "single-track file uses channel {extra}; expected channels 0-3"
                ))
                .into());
            }
            (0..VOICE_COUNT as u8)
                .map(|ch| {
                    notes
                        .iter()
                        .filter(|(c, _)| *c == ch)
                        .map(|(_, n)| *n)
                        .collect()
                })
                .collect()
        }
        n if n < VOICE_COUNT => {
            return Err(PreprocessingError::VoiceLayout(format!(
                "found {n} tracks with notes; expected {VOICE_COUNT}"
            ))
            .into());
        }
        n => {
            if n > VOICE_COUNT {
                warn!(tracks = n, "ignoring note tracks after the fourth");
            }
            tracks
                .into_iter()
                .take(VOICE_COUNT)
                .map(|notes| notes.into_iter().map(|(_, n)| n).collect())
                .collect()
        }
    };

    if let Some(silent) = voices.iter().position(|v| v.is_empty()) {
        return Err(PreprocessingError::VoiceLayout(format!("voice {} has no notes", silent + 1)).into());
    }
    Ok(voices)
}

/// Pair note-ons with note-offs in one track. A note-on with velocity 0 is
/// a note-off. Notes still held at the end of the track end there.
fn collect_track_notes(track: &[midly::TrackEvent<'_>]) -> Vec<(u8, MidiNote)> {
    let mut notes = Vec::new();
    // (channel, key, start) of held notes.
    let mut held: Vec<(u8, u8, u64)> = Vec::new();
    let mut tick: u64 = 0;

    for event in track {
        tick += event.delta.as_int() as u64;
        let TrackEventKind::Midi { channel, message } = event.kind else {
            continue;
        };
        let channel = channel.as_int();
        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                held.push((channel, key.as_int(), tick));
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let key = key.as_int();
                if let Some(pos) = held.iter().position(|&(c, k, _)| c == channel && k == key) {
                    let (_, _, start) = held.remove(pos);
                    if tick > start {
                        notes.push((channel, MidiNote { key, start, end: tick }));
                    }
                }
            }
            _ => {}
        }
    }

    for (channel, key, start) in held {
        if tick > start {
            notes.push((channel, MidiNote { key, start, end: tick }));
        }
    }
    notes.sort_by_key(|(_, n)| (n.start, n.key));
    notes
}

/// The note sounding at `tick` in one voice. If several overlap, the most
/// recently started wins.
fn sounding_at(notes: &[MidiNote], tick: u64) -> Option<u8> {
    notes
        .iter()
        .filter(|n| n.start <= tick && tick < n.end)
        .max_by_key(|n| n.start)
        .map(|n| n.key)
}

/// Cut four voices into slices at every onset.
pub fn chordify(voices: &[Vec<MidiNote>]) -> Result<Vec<Slice>> {
    if voices.len() != VOICE_COUNT {
        return Err(PreprocessingError::VoiceLayout(format!(
            "expected {VOICE_COUNT} voices, found {}",
            voices.len()
        ))
        .into());
    }

    let onsets: BTreeSet<u64> = voices.iter().flatten().map(|n| n.start).collect();
    let end = voices.iter().flatten().map(|n| n.end).max().unwrap_or(0);
    let onsets: Vec<u64> = onsets.into_iter().collect();

    let mut slices = Vec::new();
    for (i, &onset) in onsets.iter().enumerate() {
        let until = onsets.get(i + 1).copied().unwrap_or(end);
        let sounding: Vec<Option<u8>> = voices.iter().map(|v| sounding_at(v, onset)).collect();

        if sounding.iter().all(Option::is_none) {
            warn!(tick = onset, "skipping slice where every voice rests");
            continue;
        }
        if let Some(resting) = sounding.iter().position(Option::is_none) {
            return Err(Error::MalformedInput(format!(
                "slice at tick {onset} has {} sounding voices ({} rests)",
                sounding.iter().flatten().count(),
                crate::chord::Voice::ALL[resting].name()
            )));
        }

        let mut keys = [0u8; VOICE_COUNT];
        for (slot, key) in keys.iter_mut().zip(sounding.into_iter().flatten()) {
            *slot = key;
        }
        slices.push(Slice {
            onset,
            duration: until - onset,
            keys,
        });
    }
    debug!(slices = slices.len(), "chordified MIDI voices");
    Ok(slices)
}
