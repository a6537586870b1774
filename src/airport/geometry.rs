//! Runway geometry resolver.
//!
//! Once an airport's reference point is final, every runway gets its
//! threshold vectors in the airport's local flat-plane frame, four
//! rectangular bounding boxes on the centreline (physical runway, TORA,
//! ASDA, proximity) and one approach proximity funnel per end. VGSI
//! fixtures collected during parsing are matched to runway ends here and
//! folded into the end's GPA/TCH.
//!
//! All polygons are counter-clockwise in the x-east / y-north frame.

use crate::geo::fpp::{dir2hdg, hdg_diff, polygon_signed_area, Fpp, Vect2};
use crate::geo::m2ft;

use super::{Airport, Runway, RunwayEndGeom, RunwayGeom, VgsiFixture, VgsiType};

/// Longitudinal extension of the runway proximity box: 2 000 ft.
const RWY_PROXIMITY_LON_DISPL: f64 = 609.6;
/// Lateral width multiplier of the proximity box.
const RWY_PROXIMITY_LAT_FRACT: f64 = 3.0;
/// Length of the approach proximity funnel in meters.
const RWY_APCH_PROXIMITY_LON_DISPL: f64 = 5_500.0;
/// Divergence half-angle of the approach funnel in degrees.
const RWY_APCH_PROXIMITY_LAT_ANGLE: f64 = 3.3;
/// VGSI fuzzy match: maximum lateral displacement in runway widths.
const VGSI_LAT_DISPL_FACT: f64 = 2.0;
/// VGSI fuzzy match: maximum heading disagreement in degrees.
const VGSI_HDG_MATCH_THRESH: f64 = 5.0;
/// Acceptance range for an inferred threshold crossing height, feet.
const VGSI_TCH_MAX: f64 = 200.0;

/// Build all derived geometry for an airport and mark it load-complete.
///
/// Idempotent; safe to call on cache-reloaded airports (whose VGSI
/// inference is already baked into the runway rows).
pub fn resolve_airport(arpt: &mut Airport) {
    debug_assert!(arpt.refpt.pos2().is_valid());
    let fpp = Fpp::new(arpt.refpt.pos2());

    for rwy in &mut arpt.runways {
        resolve_runway(&fpp, rwy);
    }

    // Approach funnels second: shearing needs every runway's vectors.
    for i in 0..arpt.runways.len() {
        for e in 0..2 {
            let bbox = make_apch_bbox(&arpt.runways, i, e);
            arpt.runways[i].ends[e]
                .geom
                .as_mut()
                .expect("runway geometry resolved")
                .apch_bbox = bbox;
        }
    }

    let fixtures = std::mem::take(&mut arpt.vgsis);
    for fx in fixtures {
        apply_vgsi(arpt, &fpp, fx);
    }

    arpt.fpp = Some(fpp);
    arpt.load_complete = true;
}

/// Threshold vectors, headings, landing lengths and the four rectangles.
fn resolve_runway(fpp: &Fpp, rwy: &mut Runway) {
    let thr0 = fpp.project(rwy.ends[0].thr.pos2());
    let thr1 = fpp.project(rwy.ends[1].thr.pos2());
    // The parser rejects degenerate runways, so the direction is well
    // defined.
    let u = (thr1 - thr0).unit();
    let dthr0 = thr0 + u.scale(rwy.ends[0].displ);
    let dthr1 = thr1 - u.scale(rwy.ends[1].displ);

    rwy.ends[0].geom = Some(RunwayEndGeom {
        thr_v: thr0,
        dthr_v: dthr0,
        hdg: dir2hdg(thr1 - thr0),
        land_len: thr0.dist(dthr1),
        apch_bbox: Vec::new(),
    });
    rwy.ends[1].geom = Some(RunwayEndGeom {
        thr_v: thr1,
        dthr_v: dthr1,
        hdg: dir2hdg(thr0 - thr1),
        land_len: thr1.dist(dthr0),
        apch_bbox: Vec::new(),
    });

    let prox_ext0 = rwy.ends[0]
        .displ
        .max(RWY_PROXIMITY_LON_DISPL - rwy.ends[0].displ);
    let prox_ext1 = rwy.ends[1]
        .displ
        .max(RWY_PROXIMITY_LON_DISPL - rwy.ends[1].displ);

    rwy.geom = Some(RunwayGeom {
        length: thr0.dist(thr1),
        rwy_bbox: make_rwy_bbox(dthr0, dthr1, rwy.width, 0.0, 0.0),
        tora_bbox: make_rwy_bbox(thr0, thr1, rwy.width, 0.0, 0.0),
        asda_bbox: make_rwy_bbox(thr0, thr1, rwy.width, rwy.ends[0].blast, rwy.ends[1].blast),
        prox_bbox: make_rwy_bbox(
            dthr0,
            dthr1,
            RWY_PROXIMITY_LAT_FRACT * rwy.width,
            prox_ext0,
            prox_ext1,
        ),
    });
}

/// Counter-clockwise rectangle around the segment `p1`→`p2`, widened to
/// `width` and extended longitudinally by `ext1` behind `p1` and `ext2`
/// beyond `p2`.
fn make_rwy_bbox(p1: Vect2, p2: Vect2, width: f64, ext1: f64, ext2: f64) -> [Vect2; 4] {
    let u = (p2 - p1).unit();
    let a = p1 - u.scale(ext1);
    let b = p2 + u.scale(ext2);
    let half = u.norm_left().scale(width / 2.0);
    let bbox = [a + half, a - half, b - half, b + half];
    debug_assert!(polygon_signed_area(&bbox) > 0.0);
    bbox
}

/// Lateral shear limits imposed by close parallel runways, per funnel
/// side (left, right). `None` means the full lateral extent applies.
fn parallel_limits(
    runways: &[Runway],
    rwy_i: usize,
    end_i: usize,
    thr: Vect2,
    left: Vect2,
    full_ext: f64,
) -> (Option<f64>, Option<f64>) {
    let end = &runways[rwy_i].ends[end_i];
    let Some(number) = end.number() else {
        return (None, None);
    };

    let mut candidates: Vec<f64> = Vec::new();
    for (j, other) in runways.iter().enumerate() {
        if j == rwy_i {
            continue;
        }
        for oend in &other.ends {
            if oend.number() != Some(number) {
                continue;
            }
            let og = oend.geom.as_ref().expect("runway geometry resolved");
            candidates.push(left.dot(og.thr_v - thr));
        }
    }
    // A bare numeric designator shared by several runways is a scenery
    // data bug; the inward cut would be ambiguous, so skip shearing.
    if end.suffix().is_none() && candidates.len() > 1 {
        return (None, None);
    }

    let mut limit_left: Option<f64> = None;
    let mut limit_right: Option<f64> = None;
    for d in candidates {
        let dist = d.abs();
        if dist >= full_ext {
            continue;
        }
        // Split the difference with the offending runway.
        let limit = dist / 2.0;
        let slot = if d > 0.0 {
            &mut limit_left
        } else {
            &mut limit_right
        };
        *slot = Some(slot.map_or(limit, |l: f64| l.min(limit)));
    }
    (limit_left, limit_right)
}

/// Build the approach proximity funnel for one runway end: 5.5 km long,
/// expanding from half the runway width at the threshold to
/// width/2 + 5500·tan(3.3°) at the far end, sheared inward where a close
/// parallel runway encroaches.
fn make_apch_bbox(runways: &[Runway], rwy_i: usize, end_i: usize) -> Vec<Vect2> {
    let rwy = &runways[rwy_i];
    let eg = rwy.ends[end_i].geom.as_ref().expect("runway geometry resolved");
    let og = rwy.ends[1 - end_i]
        .geom
        .as_ref()
        .expect("runway geometry resolved");

    let thr = eg.thr_v;
    let u = (og.thr_v - thr).unit();
    let left = u.norm_left();
    let half_w = rwy.width / 2.0;
    let full_ext = half_w
        + RWY_APCH_PROXIMITY_LON_DISPL * RWY_APCH_PROXIMITY_LAT_ANGLE.to_radians().tan();
    let far = thr - u.scale(RWY_APCH_PROXIMITY_LON_DISPL);

    let (limit_left, limit_right) = parallel_limits(runways, rwy_i, end_i, thr, left, full_ext);

    // One side of the funnel, threshold to far end. A usable shear limit
    // inserts an extra vertex where the expanding edge hits it.
    let side_points = |sign: f64, limit: Option<f64>| -> Vec<Vect2> {
        let s = left.scale(sign);
        match limit {
            Some(limit) if limit > half_w && limit < full_ext => {
                let l0 = RWY_APCH_PROXIMITY_LON_DISPL * (limit - half_w) / (full_ext - half_w);
                vec![
                    thr + s.scale(half_w),
                    thr - u.scale(l0) + s.scale(limit),
                    far + s.scale(limit),
                ]
            }
            _ => vec![thr + s.scale(half_w), far + s.scale(full_ext)],
        }
    };

    let mut poly = side_points(1.0, limit_left);
    let mut right = side_points(-1.0, limit_right);
    right.reverse();
    poly.extend(right);
    debug_assert!((4..=6).contains(&poly.len()));
    debug_assert!(polygon_signed_area(&poly) > 0.0);
    poly
}

/// Match one VGSI fixture to a runway end and fold its glide path into
/// the end's GPA/TCH.
fn apply_vgsi(arpt: &mut Airport, fpp: &Fpp, fx: VgsiFixture) {
    let v = fpp.project(fx.pos);

    // (runway, end, longitudinal displacement from the threshold).
    let mut matched: Option<(usize, usize, f64)> = None;

    if let Some(id) = &fx.rwy_id {
        'outer: for (i, rwy) in arpt.runways.iter().enumerate() {
            for (e, end) in rwy.ends.iter().enumerate() {
                if &end.id == id {
                    let eg = end.geom.as_ref().expect("runway geometry resolved");
                    let u = (rwy.ends[1 - e]
                        .geom
                        .as_ref()
                        .expect("runway geometry resolved")
                        .thr_v
                        - eg.thr_v)
                        .unit();
                    matched = Some((i, e, u.dot(v - eg.thr_v)));
                    break 'outer;
                }
            }
        }
    }

    if matched.is_none() {
        // Geometric fuzzy match over all runway ends.
        let mut best_lat = f64::INFINITY;
        for (i, rwy) in arpt.runways.iter().enumerate() {
            let length = rwy.geom.as_ref().expect("runway geometry resolved").length;
            for e in 0..2 {
                let eg = rwy.ends[e].geom.as_ref().expect("runway geometry resolved");
                let u = (rwy.ends[1 - e]
                    .geom
                    .as_ref()
                    .expect("runway geometry resolved")
                    .thr_v
                    - eg.thr_v)
                    .unit();
                let rel = v - eg.thr_v;
                let along = u.dot(rel);
                let lat = u.norm_left().dot(rel);
                if lat.abs() > VGSI_LAT_DISPL_FACT * rwy.width {
                    continue;
                }
                if !(0.0..=length).contains(&along) {
                    continue;
                }
                if hdg_diff(fx.hdg, eg.hdg) > VGSI_HDG_MATCH_THRESH {
                    continue;
                }
                // Left/right PAPIs must sit on their own side of the
                // centreline as seen by the approaching pilot.
                let side_ok = match fx.vgsi_type {
                    VgsiType::Papi4L => lat > 0.0,
                    VgsiType::Papi4R => lat < 0.0,
                    VgsiType::Vasi => true,
                };
                if !side_ok {
                    continue;
                }
                if lat.abs() < best_lat {
                    best_lat = lat.abs();
                    matched = Some((i, e, along));
                }
            }
        }
    }

    let Some((i, e, along)) = matched else {
        return;
    };
    let tch = m2ft(fx.gpa.to_radians().sin() * along);
    if !(tch > 0.0 && tch < VGSI_TCH_MAX) {
        return;
    }
    let end = &mut arpt.runways[i].ends[e];
    end.gpa = fx.gpa;
    end.tch = tch;
}
