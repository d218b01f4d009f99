//! Which cluster belongs to which player.

use serde::Serialize;

use crate::calibration::CalibrationSnapshot;
use crate::color::{rgb_to_hsv, Rgb};
use crate::models::Player;

use super::features::FeatureSample;
use super::kmeans::{distance, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    Calibration,
    ExistingLabels,
    ColorOrder,
}

fn centroid_rgb(centroid: &Point) -> Rgb {
    let channel = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(centroid[0]), channel(centroid[1]), channel(centroid[2]))
}

/// Both calibrated colors known: the pairing with the smaller total RGB
/// distance.
fn by_calibration(centroids: &[Point], calibration: &CalibrationSnapshot) -> Option<[Player; 2]> {
    let (a, b) = calibration.pair()?;
    let a = a.to_rgb().normalized();
    let b = b.to_rgb().normalized();

    let straight = distance(&centroids[0], &a) + distance(&centroids[1], &b);
    let swapped = distance(&centroids[0], &b) + distance(&centroids[1], &a);
    Some(if straight <= swapped {
        [Player::A, Player::B]
    } else {
        [Player::B, Player::A]
    })
}

/// Strict majority of existing labels among a cluster's members.
fn majority_label(members: &[usize], samples: &[FeatureSample]) -> Option<Player> {
    let (mut a, mut b) = (0usize, 0usize);
    for &i in members {
        match samples[i].existing_label {
            Some(Player::A) => a += 1,
            Some(Player::B) => b += 1,
            None => {}
        }
    }
    match a.cmp(&b) {
        std::cmp::Ordering::Greater => Some(Player::A),
        std::cmp::Ordering::Less => Some(Player::B),
        std::cmp::Ordering::Equal => None,
    }
}

/// Resolve a player per cluster, first strategy that decides wins:
/// calibration distance, then member label majority, then hue-then-brightness
/// order. Players are never assigned twice.
pub fn map_clusters(
    centroids: &[Point],
    members: &[Vec<usize>],
    samples: &[FeatureSample],
    calibration: &CalibrationSnapshot,
) -> Vec<(Player, MappingSource)> {
    let k = centroids.len();

    if k == 2 {
        if let Some(pairing) = by_calibration(centroids, calibration) {
            return pairing
                .into_iter()
                .map(|player| (player, MappingSource::Calibration))
                .collect();
        }
    }

    let mut mapped: Vec<Option<(Player, MappingSource)>> = vec![None; k];
    let mut used: Vec<Player> = Vec::new();

    for (cluster, slot) in mapped.iter_mut().enumerate() {
        if let Some(player) = majority_label(&members[cluster], samples) {
            if !used.contains(&player) {
                *slot = Some((player, MappingSource::ExistingLabels));
                used.push(player);
            }
        }
    }

    let mut remaining: Vec<usize> = (0..k).filter(|&c| mapped[c].is_none()).collect();
    if !remaining.is_empty() {
        let mut order: Vec<usize> = (0..k).collect();
        order.sort_by(|&x, &y| {
            let hx = hue_and_value(&centroids[x]);
            let hy = hue_and_value(&centroids[y]);
            hx.0.total_cmp(&hy.0).then(hx.1.total_cmp(&hy.1))
        });
        remaining.sort_by_key(|c| order.iter().position(|o| o == c));

        let mut free = Player::BOTH.into_iter().filter(|p| !used.contains(p));
        for cluster in remaining {
            // k <= 2, so a free player always exists here
            if let Some(player) = free.next() {
                mapped[cluster] = Some((player, MappingSource::ColorOrder));
            }
        }
    }

    mapped
        .into_iter()
        .map(|m| m.unwrap_or((Player::A, MappingSource::ColorOrder)))
        .collect()
}

fn hue_and_value(centroid: &Point) -> (f32, f32) {
    let rgb = centroid_rgb(centroid);
    let hsv = rgb_to_hsv(rgb.r, rgb.g, rgb.b);
    (hsv.h, hsv.v)
}
