//! ScoreModel validation: enforces the invariants from the data model before
//! an edit is allowed to become a new snapshot. Rejected edits leave the
//! previous ScoreModel untouched — this runs entirely on the control thread.

use crate::error::{Error, Result};
use crate::score::clone_resolve::check_no_clone_cycles;
use crate::score::entities::{Project, Track, TrackKind};

pub fn validate_project(project: &Project) -> Result<()> {
    for song in &project.songs {
        let master_count = song
            .tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Master)
            .count();
        if master_count != 1 {
            return Err(Error::InvalidEdit(format!(
                "song {:?} must have exactly one master track, found {}",
                song.name, master_count
            )));
        }

        check_no_clone_cycles(song)?;

        for track in &song.tracks {
            validate_track(track)?;
        }
    }
    Ok(())
}

fn validate_track(track: &Track) -> Result<()> {
    let mut sorted: Vec<_> = track.containers.iter().collect();
    sorted.sort_by(|a, b| a.start_bar.partial_cmp(&b.start_bar).unwrap());

    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.end_bar() > b.start_bar {
            let has_crossfade = track
                .crossfades
                .iter()
                .any(|cf| cf.involves(a.id) && cf.involves(b.id));
            if !has_crossfade {
                return Err(Error::OverlappingContainer(b.id));
            }
        }
    }

    for crossfade in &track.crossfades {
        let a = track.container(crossfade.container_a);
        let b = track.container(crossfade.container_b);
        match (a, b) {
            (Some(a), Some(b)) => {
                let overlap = a.end_bar().min(b.end_bar()) - a.start_bar.max(b.start_bar);
                if overlap <= 0.0 {
                    return Err(Error::InvalidEdit(format!(
                        "crossfade between {:?} and {:?} has no positive overlap",
                        a.id, b.id
                    )));
                }
            }
            _ => {
                return Err(Error::InvalidEdit(
                    "crossfade references a missing container".into(),
                ))
            }
        }
    }

    for container in &track.containers {
        for lane in &container.automation_lanes {
            if !lane.is_sorted() {
                return Err(Error::InvalidEdit(format!(
                    "automation lane {:?} breakpoints are not strictly sorted",
                    lane.id
                )));
            }
        }

        if let crate::score::entities::ContainerPayload::Audio {
            audio_start_offset_bars,
            ..
        } = &container.payload
        {
            if *audio_start_offset_bars < 0.0 {
                return Err(Error::InvalidEdit(format!(
                    "container {:?} has a negative audio start offset",
                    container.id
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAllocator;
    use crate::score::entities::*;
    use crate::time::TimeSignature;

    fn base_song(tracks: Vec<Track>) -> Song {
        Song {
            name: "test".into(),
            signature: TimeSignature::four_four(),
            tempo_bpm: 120.0,
            count_in_bars: 0,
            metronome: MetronomeConfig::default(),
            tracks,
            sections: Vec::new(),
        }
    }

    fn empty_container(ids: &IdAllocator, track_id: TrackId, start: f64, len: f64) -> Container {
        Container {
            id: ids.alloc_container(),
            track_id,
            start_bar: start,
            length_bars: len,
            payload: ContainerPayload::Empty,
            enter_fade: None,
            exit_fade: None,
            loop_policy: LoopPolicy::None,
            record_armed: false,
            is_clone: false,
            source_container_id: None,
            overridden_fields: Vec::new(),
            on_enter_actions: Vec::new(),
            on_exit_actions: Vec::new(),
            automation_lanes: Vec::new(),
        }
    }

    #[test]
    fn rejects_overlap_without_crossfade() {
        let ids = IdAllocator::new();
        let track_id = ids.alloc_track();
        let a = empty_container(&ids, track_id, 1.0, 4.0);
        let b = empty_container(&ids, track_id, 3.0, 4.0);
        let track = Track {
            id: track_id,
            kind: TrackKind::Audio,
            name: "t".into(),
            mix: MixParams::default(),
            record_armed: false,
            mute: false,
            solo: false,
            effect_chain: Vec::new(),
            midi_input_filter: MidiInputFilter::any(),
            containers: vec![a, b],
            crossfades: Vec::new(),
            instrument_handle: None,
        };
        let master = Track {
            id: ids.alloc_track(),
            kind: TrackKind::Master,
            name: "master".into(),
            mix: MixParams::default(),
            record_armed: false,
            mute: false,
            solo: false,
            effect_chain: Vec::new(),
            midi_input_filter: MidiInputFilter::any(),
            containers: Vec::new(),
            crossfades: Vec::new(),
            instrument_handle: None,
        };
        let project = Project {
            songs: vec![base_song(vec![track, master])],
            current_song: 0,
            source_recordings: Vec::new(),
            audio_device: AudioDeviceSettings {
                sample_rate: 44_100,
                channels: 2,
                input_device_name: None,
                output_device_name: None,
            },
        };
        assert!(matches!(
            validate_project(&project),
            Err(Error::OverlappingContainer(_))
        ));
    }

    #[test]
    fn accepts_overlap_with_crossfade() {
        let ids = IdAllocator::new();
        let track_id = ids.alloc_track();
        let a = empty_container(&ids, track_id, 1.0, 4.0);
        let b = empty_container(&ids, track_id, 3.0, 4.0);
        let crossfade = Crossfade {
            container_a: a.id,
            container_b: b.id,
            curve: CurveType::Linear,
        };
        let track = Track {
            id: track_id,
            kind: TrackKind::Audio,
            name: "t".into(),
            mix: MixParams::default(),
            record_armed: false,
            mute: false,
            solo: false,
            effect_chain: Vec::new(),
            midi_input_filter: MidiInputFilter::any(),
            containers: vec![a, b],
            crossfades: vec![crossfade],
            instrument_handle: None,
        };
        let master = Track {
            id: ids.alloc_track(),
            kind: TrackKind::Master,
            name: "master".into(),
            mix: MixParams::default(),
            record_armed: false,
            mute: false,
            solo: false,
            effect_chain: Vec::new(),
            midi_input_filter: MidiInputFilter::any(),
            containers: Vec::new(),
            crossfades: Vec::new(),
            instrument_handle: None,
        };
        let project = Project {
            songs: vec![base_song(vec![track, master])],
            current_song: 0,
            source_recordings: Vec::new(),
            audio_device: AudioDeviceSettings {
                sample_rate: 44_100,
                channels: 2,
                input_device_name: None,
                output_device_name: None,
            },
        };
        assert!(validate_project(&project).is_ok());
    }

    #[test]
    fn rejects_missing_master_track() {
        let ids = IdAllocator::new();
        let track = Track {
            id: ids.alloc_track(),
            kind: TrackKind::Audio,
            name: "t".into(),
            mix: MixParams::default(),
            record_armed: false,
            mute: false,
            solo: false,
            effect_chain: Vec::new(),
            midi_input_filter: MidiInputFilter::any(),
            containers: Vec::new(),
            crossfades: Vec::new(),
            instrument_handle: None,
        };
        let project = Project {
            songs: vec![base_song(vec![track])],
            current_song: 0,
            source_recordings: Vec::new(),
            audio_device: AudioDeviceSettings {
                sample_rate: 44_100,
                channels: 2,
                input_device_name: None,
                output_device_name: None,
            },
        };
        assert!(validate_project(&project).is_err());
    }

    #[test]
    fn rejects_clone_cycle() {
        let ids = IdAllocator::new();
        let track_id = ids.alloc_track();
        let mut a = empty_container(&ids, track_id, 0.0, 4.0);
        let mut b = empty_container(&ids, track_id, 4.0, 4.0);
        a.is_clone = true;
        a.source_container_id = Some(b.id);
        b.is_clone = true;
        b.source_container_id = Some(a.id);
        let track = Track {
            id: track_id,
            kind: TrackKind::Audio,
            name: "t".into(),
            mix: MixParams::default(),
            record_armed: false,
            mute: false,
            solo: false,
            effect_chain: Vec::new(),
            midi_input_filter: MidiInputFilter::any(),
            containers: vec![a, b],
            crossfades: Vec::new(),
            instrument_handle: None,
        };
        let master = Track {
            id: ids.alloc_track(),
            kind: TrackKind::Master,
            name: "master".into(),
            mix: MixParams::default(),
            record_armed: false,
            mute: false,
            solo: false,
            effect_chain: Vec::new(),
            midi_input_filter: MidiInputFilter::any(),
            containers: Vec::new(),
            crossfades: Vec::new(),
            instrument_handle: None,
        };
        let project = Project {
            songs: vec![base_song(vec![track, master])],
            current_song: 0,
            source_recordings: Vec::new(),
            audio_device: AudioDeviceSettings {
                sample_rate: 44_100,
                channels: 2,
                input_device_name: None,
                output_device_name: None,
            },
        };
        assert!(matches!(
            validate_project(&project),
            Err(Error::InvalidEdit(_))
        ));
    }
}
