//! Clone resolution: a container marked `is_clone` inherits every field it
//! hasn't explicitly overridden from `sourceContainerID`, followed
//! recursively through a chain of clones back to a concrete container.
//! Resolution happens once, when the control thread builds the snapshot
//! that's about to be installed — the scheduler only ever sees containers
//! with concrete, already-resolved fields.

use crate::error::{Error, Result};
use crate::score::entities::{Container, OverridableField, Project, Song};
use std::collections::HashSet;
use crate::ids::ContainerId;

/// Materialize every clone container's inherited fields in place. Must run
/// (and succeed) before a project is handed to [`crate::score::validate_project`]
/// and installed into a [`crate::score::SnapshotHandle`].
pub fn resolve_clones(project: &mut Project) -> Result<()> {
    for song in &mut project.songs {
        resolve_song_clones(song)?;
    }
    Ok(())
}

/// Detect cycles in the clone graph without mutating anything; used by
/// [`crate::score::validate_project`] so a cyclic edit is rejected even if
/// the caller forgot to run [`resolve_clones`] first.
pub fn check_no_clone_cycles(song: &Song) -> Result<()> {
    let all: Vec<&Container> = song.tracks.iter().flat_map(|t| &t.containers).collect();
    for container in &all {
        if !container.is_clone {
            continue;
        }
        let mut visited = HashSet::new();
        let mut current = *container;
        visited.insert(current.id);
        while let Some(source_id) = current.source_container_id.filter(|_| current.is_clone) {
            if !visited.insert(source_id) {
                return Err(Error::InvalidEdit(format!(
                    "clone cycle detected at container {:?}",
                    source_id
                )));
            }
            let Some(next) = all.iter().find(|c| c.id == source_id) else {
                return Err(Error::ContainerNotFound(source_id));
            };
            current = *next;
        }
    }
    Ok(())
}

fn resolve_song_clones(song: &mut Song) -> Result<()> {
    let original: Vec<Container> = song
        .tracks
        .iter()
        .flat_map(|t| t.containers.iter().cloned())
        .collect();

    for track in &mut song.tracks {
        for container in &mut track.containers {
            if !container.is_clone {
                continue;
            }
            let Some(source_id) = container.source_container_id else {
                continue;
            };
            let mut visited = HashSet::new();
            visited.insert(container.id);
            let resolved_source = resolve_chain(&original, source_id, &mut visited)?;
            apply_inherited_fields(container, &resolved_source);
        }
    }
    Ok(())
}

/// Follow `source_container_id` until a non-clone container (or a fully
/// overridden clone) is reached, merging inherited fields at each step.
/// Returns the fully-resolved container `id` would inherit from.
fn resolve_chain(
    original: &[Container],
    id: ContainerId,
    visited: &mut HashSet<ContainerId>,
) -> Result<Container> {
    if !visited.insert(id) {
        return Err(Error::InvalidEdit(format!(
            "clone cycle detected at container {:?}",
            id
        )));
    }
    let source = original
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .ok_or(Error::ContainerNotFound(id))?;

    if source.is_clone {
        if let Some(next_id) = source.source_container_id {
            let mut merged = source.clone();
            let resolved_next = resolve_chain(original, next_id, visited)?;
            apply_inherited_fields(&mut merged, &resolved_next);
            return Ok(merged);
        }
    }
    Ok(source)
}

fn apply_inherited_fields(container: &mut Container, source: &Container) {
    use OverridableField::*;

    if !container.overrides(Payload) {
        container.payload = source.payload.clone();
    }
    if !container.overrides(EnterFade) {
        container.enter_fade = source.enter_fade;
    }
    if !container.overrides(ExitFade) {
        container.exit_fade = source.exit_fade;
    }
    if !container.overrides(LoopPolicy) {
        container.loop_policy = source.loop_policy;
    }
    if !container.overrides(OnEnterActions) {
        container.on_enter_actions = source.on_enter_actions.clone();
    }
    if !container.overrides(OnExitActions) {
        container.on_exit_actions = source.on_exit_actions.clone();
    }
    if !container.overrides(AutomationLanes) {
        container.automation_lanes = source.automation_lanes.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAllocator;
    use crate::score::entities::*;
    use crate::time::TimeSignature;

    fn base_container(id: ContainerId, track_id: TrackId) -> Container {
        Container {
            id,
            track_id,
            start_bar: 0.0,
            length_bars: 4.0,
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

    fn song_with(containers: Vec<Container>, track_id: TrackId) -> Song {
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
            containers,
            crossfades: Vec::new(),
            instrument_handle: None,
        };
        Song {
            name: "song".into(),
            signature: TimeSignature::four_four(),
            tempo_bpm: 120.0,
            count_in_bars: 0,
            metronome: MetronomeConfig::default(),
            tracks: vec![track],
            sections: Vec::new(),
        }
    }

    #[test]
    fn clone_inherits_unoverridden_payload() {
        let ids = IdAllocator::new();
        let track_id = ids.alloc_track();
        let recording = ids.alloc_source_recording();

        let mut source = base_container(ids.alloc_container(), track_id);
        source.payload = ContainerPayload::Audio {
            recording_ref: recording,
            audio_start_offset_bars: 0.0,
            gain: 0.9,
        };

        let mut clone = base_container(ids.alloc_container(), track_id);
        clone.is_clone = true;
        clone.source_container_id = Some(source.id);

        let mut song = song_with(vec![source, clone], track_id);
        resolve_song_clones(&mut song).unwrap();

        match &song.tracks[0].containers[1].payload {
            ContainerPayload::Audio { gain, .. } => assert_eq!(*gain, 0.9),
            other => panic!("expected inherited audio payload, got {other:?}"),
        }
    }

    #[test]
    fn clone_keeps_overridden_field_instead_of_inheriting() {
        let ids = IdAllocator::new();
        let track_id = ids.alloc_track();
        let recording = ids.alloc_source_recording();

        let mut source = base_container(ids.alloc_container(), track_id);
        source.payload = ContainerPayload::Audio {
            recording_ref: recording,
            audio_start_offset_bars: 0.0,
            gain: 0.9,
        };

        let mut clone = base_container(ids.alloc_container(), track_id);
        clone.is_clone = true;
        clone.source_container_id = Some(source.id);
        clone.overridden_fields = vec![OverridableField::Payload];
        clone.payload = ContainerPayload::Empty;

        let mut song = song_with(vec![source, clone], track_id);
        resolve_song_clones(&mut song).unwrap();

        assert!(matches!(
            song.tracks[0].containers[1].payload,
            ContainerPayload::Empty
        ));
    }

    #[test]
    fn chained_clones_resolve_through_multiple_hops() {
        let ids = IdAllocator::new();
        let track_id = ids.alloc_track();
        let recording = ids.alloc_source_recording();

        let mut root = base_container(ids.alloc_container(), track_id);
        root.payload = ContainerPayload::Audio {
            recording_ref: recording,
            audio_start_offset_bars: 0.0,
            gain: 0.5,
        };

        let mut middle = base_container(ids.alloc_container(), track_id);
        middle.is_clone = true;
        middle.source_container_id = Some(root.id);

        let mut leaf = base_container(ids.alloc_container(), track_id);
        leaf.is_clone = true;
        leaf.source_container_id = Some(middle.id);

        let mut song = song_with(vec![root, middle, leaf], track_id);
        resolve_song_clones(&mut song).unwrap();

        match &song.tracks[0].containers[2].payload {
            ContainerPayload::Audio { gain, .. } => assert_eq!(*gain, 0.5),
            other => panic!("expected inherited audio payload, got {other:?}"),
        }
    }

    #[test]
    fn direct_cycle_is_rejected() {
        let ids = IdAllocator::new();
        let track_id = ids.alloc_track();

        let a_id = ids.alloc_container();
        let b_id = ids.alloc_container();

        let mut a = base_container(a_id, track_id);
        a.is_clone = true;
        a.source_container_id = Some(b_id);

        let mut b = base_container(b_id, track_id);
        b.is_clone = true;
        b.source_container_id = Some(a_id);

        let mut song = song_with(vec![a, b], track_id);
        assert!(resolve_song_clones(&mut song).is_err());
        assert!(check_no_clone_cycles(&song).is_err());
    }

    #[test]
    fn acyclic_chain_passes_the_cycle_check() {
        let ids = IdAllocator::new();
        let track_id = ids.alloc_track();

        let root = base_container(ids.alloc_container(), track_id);
        let mut clone = base_container(ids.alloc_container(), track_id);
        clone.is_clone = true;
        clone.source_container_id = Some(root.id);

        let song = song_with(vec![root, clone], track_id);
        assert!(check_no_clone_cycles(&song).is_ok());
    }
}
