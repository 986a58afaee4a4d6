//! Shuffle algorithms for queue randomization
//!
//! `Random` is a Fisher-Yates shuffle and therefore uniform over all
//! permutations. `Smart` trades uniformity for artist spread. Both return a
//! permutation of their input: no track is added, dropped or duplicated.

use crate::types::ShuffleStrategy;
use rand::seq::SliceRandom;
use rand::thread_rng;
use resonance_core::Track;
use std::collections::HashMap;
use std::sync::Arc;

/// Shuffle a queue of tracks in place
pub fn shuffle_tracks(tracks: &mut [Arc<Track>], strategy: ShuffleStrategy) {
    match strategy {
        ShuffleStrategy::Random => shuffle_random(tracks),
        ShuffleStrategy::Smart => shuffle_smart(tracks),
    }
}

/// Return a shuffled copy, leaving `tracks` untouched
pub fn shuffled(tracks: &[Arc<Track>], strategy: ShuffleStrategy) -> Vec<Arc<Track>> {
    let mut copy = tracks.to_vec();
    shuffle_tracks(&mut copy, strategy);
    copy
}

fn shuffle_random(tracks: &mut [Arc<Track>]) {
    let mut rng = thread_rng();
    tracks.shuffle(&mut rng);
}

/// Smart shuffle
///
/// 1. Group tracks by primary artist (tracks without artists share a group)
/// 2. Shuffle within each group and shuffle the group order
/// 3. Round-robin across groups
fn shuffle_smart(tracks: &mut [Arc<Track>]) {
    if tracks.len() <= 2 {
        shuffle_random(tracks);
        return;
    }

    let mut rng = thread_rng();

    let mut by_artist: HashMap<&str, Vec<Arc<Track>>> = HashMap::new();
    for track in tracks.iter() {
        by_artist
            .entry(track.primary_artist().unwrap_or(""))
            .or_default()
            .push(Arc::clone(track));
    }

    let mut groups: Vec<Vec<Arc<Track>>> = by_artist.into_values().collect();
    for group in &mut groups {
        group.shuffle(&mut rng);
    }
    groups.shuffle(&mut rng);

    let mut result = Vec::with_capacity(tracks.len());
    let mut round = 0;
    while result.len() < tracks.len() {
        for group in &groups {
            if let Some(track) = group.get(round) {
                result.push(Arc::clone(track));
            }
        }
        round += 1;
    }

    for (slot, track) in tracks.iter_mut().zip(result) {
        *slot = track;
    }
}
