//! FFmpeg video filter construction for panning renders.

use panreel_models::PanningPlan;

/// Escape a filter option value for the filtergraph parser.
///
/// Commas separate filters in a chain, so any comma inside an expression
/// must be escaped.
pub fn escape_filter_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace(',', "\\,")
}

/// Resample the looped still image to a constant frame rate.
pub fn filter_fps(fps: u32) -> String {
    format!("fps={}", fps)
}

/// Moving crop window: fixed size and vertical origin, time-varying x.
pub fn filter_pan_crop(plan: &PanningPlan) -> String {
    format!(
        "crop=w={}:h={}:x={}:y={}",
        plan.crop_width,
        plan.crop_height,
        escape_filter_value(&plan.crop_x_expression()),
        plan.y_offset
    )
}

/// Scale the crop window to the encoded frame size with square pixels.
pub fn filter_output_scale(plan: &PanningPlan) -> String {
    let encoded = plan.encoded_resolution();
    format!("scale={}:{}:flags=lanczos,setsar=1", encoded.width, encoded.height)
}

/// Full filter chain for a panning render.
///
/// The frame-rate filter runs first so the crop expression is evaluated on
/// the output timeline.
pub fn build_pan_filter(plan: &PanningPlan, fps: u32) -> String {
    [
        filter_fps(fps),
        filter_pan_crop(plan),
        filter_output_scale(plan),
    ]
    .join(",")
}
