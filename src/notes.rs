//! The note-event data model and the loaders that produce it: a midly-backed
//! MIDI file reader and a deterministic synthetic fallback for when parsing
//! fails.

use anyhow::{Context as _, Result};
use log::warn;
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::{collections::HashMap, fs, path::Path, sync::Arc};

/// One musical note occurrence, in seconds from the start of the piece.
///
/// `track` and `channel` only ever pick a display color; they carry no
/// musical meaning for the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteEvent {
    pub key: u8,
    pub velocity: u8,
    pub start: f64,
    pub duration: f64,
    pub track: u32,
    pub channel: u8,
}

impl NoteEvent {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether the playhead currently falls within this note.
    pub fn is_active(&self, time: f64) -> bool {
        time >= self.start && time <= self.end()
    }
}

/// Loads `path` as a MIDI file, substituting the synthetic sequence when the
/// file is unreadable, unparseable, or empty. Never fails.
pub fn load_or_synthetic(path: &Path) -> Arc<Vec<NoteEvent>> {
    match load(path) {
        Ok(notes) if !notes.is_empty() => Arc::new(notes),
        Ok(_) => {
            warn!("{} contains no notes, using placeholder", path.display());
            Arc::new(synthetic())
        }
        Err(e) => {
            warn!("failed to load {}: {e}, using placeholder", path.display());
            Arc::new(synthetic())
        }
    }
}

pub fn load(path: &Path) -> Result<Vec<NoteEvent>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    from_midi(&bytes)
}

/// Parses standard MIDI bytes into a note list sorted by start time.
///
/// Tempo events from all tracks feed a shared tempo map; note-on/note-off
/// pairs match per track, channel and key, with a note-on of velocity zero
/// counting as a note-off. Notes that never end are closed at the end of
/// their track.
pub fn from_midi(bytes: &[u8]) -> Result<Vec<NoteEvent>> {
    let smf = Smf::parse(bytes).context("parsing MIDI")?;
    let tempo_map = TempoMap::new(smf.header.timing, &smf);

    let mut notes = Vec::new();
    let mut time = 0_u64;

    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut playing: HashMap<(u8, u8), (u64, u8)> = HashMap::new();

        for event in track {
            time += u64::from(event.delta.as_int());

            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let channel = channel.as_int();

            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    playing
                        .entry((channel, key.as_int()))
                        .or_insert((time, vel.as_int()));
                }
                MidiMessage::NoteOff { key, .. } | MidiMessage::NoteOn { key, .. } => {
                    if let Some((start, vel)) = playing.remove(&(channel, key.as_int())) {
                        notes.push(make_note(
                            &tempo_map,
                            track_index,
                            channel,
                            key.as_int(),
                            vel,
                            start,
                            time,
                        ));
                    }
                }
                _ => {}
            }
        }

        for ((channel, key), (start, vel)) in playing {
            warn!("note {key} on channel {channel} wasn't ended");
            notes.push(make_note(
                &tempo_map, track_index, channel, key, vel, start, time,
            ));
        }

        if matches!(smf.header.format, Format::Parallel) {
            time = 0;
        }
    }

    notes.sort_by(|a, b| a.start.total_cmp(&b.start));

    Ok(notes)
}

fn make_note(
    tempo_map: &TempoMap,
    track: usize,
    channel: u8,
    key: u8,
    velocity: u8,
    start_tick: u64,
    end_tick: u64,
) -> NoteEvent {
    let start = tempo_map.seconds_at(start_tick);

    NoteEvent {
        key,
        velocity,
        start,
        duration: tempo_map.seconds_at(end_tick) - start,
        track: track as u32,
        channel,
    }
}

/// Piecewise-linear tick-to-seconds conversion.
///
/// Metrical timing honors every tempo event; timecode timing is a fixed
/// frame duration per tick and ignores tempo events entirely.
struct TempoMap {
    /// (tick, seconds at that tick, seconds per tick from that tick on)
    segments: Vec<(u64, f64, f64)>,
}

impl TempoMap {
    const DEFAULT_TEMPO: u32 = 500_000;

    fn new(timing: Timing, smf: &Smf<'_>) -> Self {
        match timing {
            Timing::Metrical(ticks_per_beat) => {
                let ticks_per_beat = f64::from(ticks_per_beat.as_int());

                let mut tempos = Vec::new();
                let mut time = 0_u64;

                for track in &smf.tracks {
                    for event in track {
                        time += u64::from(event.delta.as_int());

                        if let TrackEventKind::Meta(MetaMessage::Tempo(us_per_beat)) = event.kind {
                            tempos.push((time, us_per_beat.as_int()));
                        }
                    }

                    if matches!(smf.header.format, Format::Parallel) {
                        time = 0;
                    }
                }

                tempos.sort_unstable_by_key(|&(tick, _)| tick);

                let per_tick =
                    |us_per_beat: u32| f64::from(us_per_beat) / 1_000_000.0 / ticks_per_beat;

                let mut segments = vec![(0, 0.0, per_tick(Self::DEFAULT_TEMPO))];

                for (tick, us_per_beat) in tempos {
                    let (last_tick, last_seconds, last_per_tick) = *segments.last().unwrap();
                    let seconds = (tick - last_tick) as f64 * last_per_tick + last_seconds;
                    segments.push((tick, seconds, per_tick(us_per_beat)));
                }

                Self { segments }
            }
            Timing::Timecode(fps, subframe) => Self {
                segments: vec![(0, 0.0, 1.0 / f64::from(fps.as_f32()) / f64::from(subframe))],
            },
        }
    }

    fn seconds_at(&self, tick: u64) -> f64 {
        let i = self
            .segments
            .partition_point(|&(start, ..)| start <= tick)
            .saturating_sub(1);
        let (start, seconds, per_tick) = self.segments[i];

        (tick - start) as f64 * per_tick + seconds
    }
}

/// A musically plausible placeholder: a pentatonic melody over a slow bass
/// line, used whenever no real MIDI source is available.
pub fn synthetic() -> Vec<NoteEvent> {
    const MELODY: [u8; 8] = [60, 62, 64, 67, 69, 72, 69, 67];
    const BASS: [u8; 4] = [36, 43, 41, 38];
    const BARS: usize = 8;

    let mut notes = Vec::new();

    for bar in 0..BARS {
        let bar_start = bar as f64 * 2.0;

        notes.push(NoteEvent {
            key: BASS[bar % BASS.len()],
            velocity: 90,
            start: bar_start,
            duration: 1.8,
            track: 1,
            channel: 1,
        });

        for (i, &key) in MELODY.iter().enumerate() {
            notes.push(NoteEvent {
                key,
                velocity: 100,
                start: i as f64 * 0.25 + bar_start,
                duration: 0.2,
                track: 0,
                channel: 0,
            });
        }
    }

    notes.sort_by(|a, b| a.start.total_cmp(&b.start));

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::{
        num::{u15, u24, u28, u4, u7},
        Header, TrackEvent,
    };
    use pretty_assertions::assert_eq;

    fn midi_event(delta: u32, channel: u8, message: MidiMessage) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(channel),
                message,
            },
        }
    }

    fn note_on(delta: u32, channel: u8, key: u8, vel: u8) -> TrackEvent<'static> {
        midi_event(
            delta,
            channel,
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        )
    }

    fn note_off(delta: u32, channel: u8, key: u8) -> TrackEvent<'static> {
        midi_event(
            delta,
            channel,
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        )
    }

    fn to_bytes(smf: &Smf<'_>) -> Vec<u8> {
        let mut bytes = Vec::new();
        smf.write_std(&mut bytes).unwrap();
        bytes
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parses_a_simple_note() {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(480)),
        ));
        smf.tracks
            .push(vec![note_on(0, 3, 60, 100), note_off(480, 3, 60)]);

        let notes = from_midi(&to_bytes(&smf)).unwrap();

        assert_eq!(notes.len(), 1);
        assert_eq!((notes[0].key, notes[0].velocity), (60, 100));
        assert_eq!((notes[0].track, notes[0].channel), (0, 3));
        assert_eq!(notes[0].start, 0.0);
        // one beat at the default 120 bpm
        assert!(close(notes[0].duration, 0.5));
    }

    #[test]
    fn tempo_changes_stretch_later_notes() {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(100)),
        ));
        smf.tracks.push(vec![
            note_on(0, 0, 60, 100),
            note_off(100, 0, 60),
            // half speed from here on (1s per beat)
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(1_000_000))),
            },
            note_on(0, 0, 62, 100),
            note_off(100, 0, 62),
        ]);

        let notes = from_midi(&to_bytes(&smf)).unwrap();

        assert!(close(notes[0].duration, 0.5));
        assert!(close(notes[1].start, 0.5));
        assert!(close(notes[1].duration, 1.0));
    }

    #[test]
    fn velocity_zero_note_on_ends_a_note() {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(480)),
        ));
        smf.tracks
            .push(vec![note_on(0, 0, 64, 80), note_on(240, 0, 64, 0)]);

        let notes = from_midi(&to_bytes(&smf)).unwrap();

        assert_eq!(notes.len(), 1);
        assert!(close(notes[0].duration, 0.25));
    }

    #[test]
    fn unterminated_notes_are_closed_at_track_end() {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(480)),
        ));
        smf.tracks
            .push(vec![note_on(0, 0, 72, 90), note_on(480, 0, 40, 90)]);

        let notes = from_midi(&to_bytes(&smf)).unwrap();

        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|note| note.duration >= 0.0));
    }

    #[test]
    fn parallel_tracks_share_a_timeline() {
        let mut smf = Smf::new(Header::new(
            Format::Parallel,
            Timing::Metrical(u15::new(480)),
        ));
        smf.tracks
            .push(vec![note_on(0, 0, 60, 100), note_off(480, 0, 60)]);
        smf.tracks
            .push(vec![note_on(0, 1, 48, 100), note_off(480, 1, 48)]);

        let notes = from_midi(&to_bytes(&smf)).unwrap();

        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|note| note.start == 0.0));
        assert_ne!(notes[0].track, notes[1].track);
    }

    #[test]
    fn output_is_sorted_by_start_time() {
        let notes = from_midi(&to_bytes(&{
            let mut smf = Smf::new(Header::new(
                Format::Parallel,
                Timing::Metrical(u15::new(480)),
            ));
            smf.tracks
                .push(vec![note_on(960, 0, 60, 100), note_off(480, 0, 60)]);
            smf.tracks
                .push(vec![note_on(0, 1, 48, 100), note_off(480, 1, 48)]);
            smf
        }))
        .unwrap();

        assert!(notes.windows(2).all(|pair| pair[0].start <= pair[1].start));
    }

    #[test]
    fn garbage_bytes_fail_without_panicking() {
        assert!(from_midi(b"not a midi file").is_err());
    }

    #[test]
    fn synthetic_fallback_is_plausible() {
        let notes = synthetic();

        assert!(!notes.is_empty());
        assert!(notes.windows(2).all(|pair| pair[0].start <= pair[1].start));
        assert!(notes.iter().all(|note| note.duration > 0.0));
        assert!(notes.iter().all(|note| (21..=108).contains(&note.key)));
        // both a melody and a bass group, distinguishable by color index
        assert!(notes.iter().any(|note| note.track == 0));
        assert!(notes.iter().any(|note| note.track == 1));
    }

    #[test]
    fn active_classification_boundaries() {
        let note = NoteEvent {
            key: 60,
            velocity: 100,
            start: 1.0,
            duration: 0.5,
            track: 0,
            channel: 0,
        };

        assert!(note.is_active(1.0));
        assert!(note.is_active(1.25));
        assert!(note.is_active(1.5));
        assert!(!note.is_active(1.5 + 1e-9));
        assert!(!note.is_active(0.999));
    }
}
