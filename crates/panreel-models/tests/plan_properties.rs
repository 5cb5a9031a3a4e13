//! Property-based invariant tests for the pan geometry planner.
//!
//! 1. The crop window fits inside the source and keeps 9:16 within a pixel
//! 2. The output frame never exceeds 720x1280 and keeps 9:16 within a pixel
//! 3. The crop is centered vertically
//! 4. A crop as wide as the source never pans
//! 5. Non-positive durations never produce a velocity
//! 6. The crop origin over time is monotone and bounded by the pan range
//! 7. Identical inputs give bit-identical plans

use panreel_models::{
    compute_panning_plan, ImageDimensions, PanningPlan, MAX_OUTPUT_HEIGHT, MAX_OUTPUT_WIDTH,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn dimensions_strategy() -> impl Strategy<Value = ImageDimensions> {
    prop_oneof![
        // Everyday photo and screenshot sizes
        (1u32..8_000, 1u32..8_000),
        // Extreme panoramas and strips
        (1u32..200_000, 1u32..64),
        (1u32..64, 1u32..200_000),
    ]
    .prop_map(|(w, h)| ImageDimensions::new(w, h).expect("strategy yields positive sides"))
}

fn duration_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![0.1f64..120.0, Just(3.0), Just(0.0), -10.0f64..0.0]
}

/// `|width - height * 9/16| <= 1`, the rounding tolerance of one pixel.
fn within_one_pixel_of_nine_sixteen(width: u32, height: u32) -> bool {
    (f64::from(width) - f64::from(height) * 9.0 / 16.0).abs() <= 1.0
}

fn plan_for(dims: ImageDimensions, duration: f64) -> PanningPlan {
    compute_panning_plan(dims, duration)
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn crop_fits_source_and_keeps_aspect(dims in dimensions_strategy(), d in duration_strategy()) {
        let plan = plan_for(dims, d);

        prop_assert!(plan.crop_width >= 1 && plan.crop_height >= 1);
        prop_assert!(plan.crop_width <= dims.width());
        prop_assert!(plan.crop_height <= dims.height());
        prop_assert!(
            within_one_pixel_of_nine_sixteen(plan.crop_width, plan.crop_height),
            "crop {}x{} for source {}", plan.crop_width, plan.crop_height, dims
        );
    }

    #[test]
    fn output_is_capped_and_keeps_aspect(dims in dimensions_strategy()) {
        let plan = plan_for(dims, 3.0);

        prop_assert!(plan.output_width >= 1 && plan.output_height >= 1);
        prop_assert!(plan.output_width <= MAX_OUTPUT_WIDTH);
        prop_assert!(plan.output_height <= MAX_OUTPUT_HEIGHT);
        prop_assert!(within_one_pixel_of_nine_sixteen(plan.output_width, plan.output_height));

        let encoded = plan.encoded_resolution();
        prop_assert_eq!(encoded.width % 2, 0);
        prop_assert_eq!(encoded.height % 2, 0);
        prop_assert!(encoded.width <= MAX_OUTPUT_WIDTH);
        prop_assert!(encoded.height <= MAX_OUTPUT_HEIGHT);
    }

    #[test]
    fn crop_is_vertically_centered(dims in dimensions_strategy()) {
        let plan = plan_for(dims, 3.0);

        prop_assert_eq!(plan.y_offset, (dims.height() - plan.crop_height) / 2);
        prop_assert!(plan.y_offset + plan.crop_height <= dims.height());
    }

    #[test]
    fn pan_range_matches_leftover_width(dims in dimensions_strategy(), d in duration_strategy()) {
        let plan = plan_for(dims, d);

        prop_assert_eq!(plan.pan_range_pixels, dims.width() - plan.crop_width);
        if plan.crop_width == dims.width() {
            prop_assert_eq!(plan.pan_range_pixels, 0);
            prop_assert_eq!(plan.pan_velocity_px_per_sec, 0.0);
        }
    }

    #[test]
    fn non_positive_duration_has_no_velocity(dims in dimensions_strategy(), d in -100.0f64..=0.0) {
        let plan = plan_for(dims, d);
        prop_assert_eq!(plan.pan_velocity_px_per_sec, 0.0);
        prop_assert!(plan.is_static());
    }

    #[test]
    fn crop_origin_is_monotone_and_bounded(
        dims in dimensions_strategy(),
        d in 0.1f64..60.0,
        mut times in prop::collection::vec(0.0f64..200.0, 2..32),
    ) {
        let plan = plan_for(dims, d);
        times.sort_by(|a, b| a.partial_cmp(b).expect("finite"));

        let range = f64::from(plan.pan_range_pixels);
        let mut previous = plan.crop_x_at(0.0);
        prop_assert_eq!(previous, 0.0);

        for t in times {
            let x = plan.crop_x_at(t);
            prop_assert!(x >= previous, "x({t}) = {x} < {previous}");
            prop_assert!(x <= range);
            previous = x;
        }

        // The window reaches the far edge by the end of the video.
        prop_assert!((plan.crop_x_at(d) - range).abs() <= 1e-6 * range.max(1.0));
    }

    #[test]
    fn identical_inputs_give_identical_plans(dims in dimensions_strategy(), d in duration_strategy()) {
        let a = plan_for(dims, d);
        let b = plan_for(dims, d);

        prop_assert_eq!(a.crop_size(), b.crop_size());
        prop_assert_eq!(a.output_resolution(), b.output_resolution());
        prop_assert_eq!(a.y_offset, b.y_offset);
        prop_assert_eq!(a.pan_range_pixels, b.pan_range_pixels);
        prop_assert_eq!(
            a.pan_velocity_px_per_sec.to_bits(),
            b.pan_velocity_px_per_sec.to_bits()
        );
    }
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn scenario_table() {
    struct Case {
        source: (u32, u32),
        duration: f64,
        crop: (u32, u32),
        output: (u32, u32),
        range: u32,
        velocity: f64,
    }

    let cases = [
        Case { source: (1920, 1080), duration: 3.0, crop: (607, 1080), output: (607, 1080), range: 1313, velocity: 437.666_666 },
        Case { source: (1080, 1920), duration: 3.0, crop: (1080, 1920), output: (720, 1280), range: 0, velocity: 0.0 },
        Case { source: (1000, 1000), duration: 5.0, crop: (562, 1000), output: (562, 1000), range: 438, velocity: 87.6 },
        Case { source: (4000, 3000), duration: 3.0, crop: (1687, 3000), output: (720, 1280), range: 2313, velocity: 771.0 },
        Case { source: (1920, 1080), duration: 0.0, crop: (607, 1080), output: (607, 1080), range: 1313, velocity: 0.0 },
    ];

    for case in cases {
        let dims = ImageDimensions::new(case.source.0, case.source.1).unwrap();
        let plan = compute_panning_plan(dims, case.duration);

        assert_eq!((plan.crop_width, plan.crop_height), case.crop, "{dims}");
        assert_eq!((plan.output_width, plan.output_height), case.output, "{dims}");
        assert_eq!(plan.pan_range_pixels, case.range, "{dims}");
        assert!(
            (plan.pan_velocity_px_per_sec - case.velocity).abs() < 1e-3,
            "{dims}: {}",
            plan.pan_velocity_px_per_sec
        );
    }
}
