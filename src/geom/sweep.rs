//! Sweep-line segment intersection over a set of tagged segments.
//!
//! The sweep advances over segment endpoints sorted by x. Entering segments
//! are tested against the segments currently crossing the sweep line, but
//! only against those carrying a different tag, so edges belonging to the
//! same polygon never report their shared endpoints as collisions.

use geo_types::{Coord, CoordFloat, Line};

use super::intersect::{intersect_lines, intersect_lines_check};

#[derive(Copy, Clone, PartialEq)]
enum EventKind {
    Begin,
    End,
}

/// Pairwise intersections between segments of *different* tags.
///
/// Returns the intersection points together with the indices of the two
/// segments that generated them.
pub fn sweep_segment_intersections<T: CoordFloat>(
    segments: &[(Line<T>, usize)],
    eps: T,
) -> Vec<(usize, usize, Coord<T>)> {
    // order every segment along x so begin events precede end events
    let ordered: Vec<Line<T>> = segments
        .iter()
        .map(|(line, _)| {
            if line.start.x <= line.end.x {
                *line
            } else {
                Line::new(line.end, line.start)
            }
        })
        .collect();

    let mut events: Vec<(T, EventKind, usize)> = Vec::with_capacity(segments.len() * 2);
    for (idx, line) in ordered.iter().enumerate() {
        events.push((line.start.x, EventKind::Begin, idx));
        events.push((line.end.x, EventKind::End, idx));
    }

    events.sort_by(|evt1, evt2| {
        evt1.0
            .partial_cmp(&evt2.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| match (evt1.1, evt2.1) {
                (EventKind::Begin, EventKind::End) => std::cmp::Ordering::Less,
                (EventKind::End, EventKind::Begin) => std::cmp::Ordering::Greater,
                _ => std::cmp::Ordering::Equal,
            })
    });

    let mut active: Vec<usize> = vec![];
    let mut intersections = vec![];

    for (_, kind, idx) in events {
        match kind {
            EventKind::Begin => {
                for &other in &active {
                    if segments[other].1 == segments[idx].1 {
                        continue;
                    }

                    let line1 = &ordered[idx];
                    let line2 = &ordered[other];
                    if intersect_lines_check(line1, line2) {
                        if let Some(pt) = intersect_lines(line1, line2, true, eps) {
                            intersections.push((other.min(idx), other.max(idx), pt));
                        } else {
                            // collinear overlap: report a shared endpoint
                            intersections.push((other.min(idx), other.max(idx), line1.start));
                        }
                    }
                }
                active.push(idx);
            }
            EventKind::End => {
                active.retain(|&other| other != idx);
            }
        }
    }

    intersections
}
