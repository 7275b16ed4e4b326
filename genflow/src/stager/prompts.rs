//! Instruction text for master derivation and pose generation.
//!
//! Pose instructions are a pure function of (pose, micro-variation flag).
//! The remote backend is not introspectable, so the maximum-rotation
//! constraint is expressed in the prompt rather than enforced as a hard
//! rejection.

use crate::core::{GroupSpec, OutputFormat, Pose};

/// Largest camera rotation the prompt will ask for, in degrees.
///
/// Requests beyond this are clamped; past this point the backend tends to
/// invent the unseen side of the subject.
pub const MAX_YAW_DEGREES: i16 = 60;

/// Clamps a requested yaw into the supported range.
#[must_use]
pub fn clamp_yaw(yaw_degrees: i16) -> i16 {
    yaw_degrees.clamp(-MAX_YAW_DEGREES, MAX_YAW_DEGREES)
}

/// Builds the instruction for one pose generation call.
#[must_use]
pub fn pose_instruction(pose: &Pose, micro_variation: bool) -> String {
    let yaw = clamp_yaw(pose.yaw_degrees);

    let mut instruction = if yaw == 0 {
        format!(
            "Re-render the subject in the '{}' pose, facing the camera directly.",
            pose.id
        )
    } else {
        let side = if yaw < 0 { "left" } else { "right" };
        format!(
            "Re-render the subject in the '{}' pose, rotating the camera {} degrees to the {} around the vertical axis.",
            pose.id,
            yaw.abs(),
            side
        )
    };

    instruction.push_str(" Keep identity, clothing, fabric texture and lighting unchanged.");

    if yaw != pose.yaw_degrees {
        instruction.push_str(&format!(
            " Do not rotate beyond {} degrees from the reference view.",
            MAX_YAW_DEGREES
        ));
    }

    if micro_variation {
        instruction
            .push_str(" Keep variation between renders minimal and barely perceptible.");
    }

    instruction
}

/// Builds the instruction for deriving a group's master artifact from the
/// base image and the group's reference swatch.
#[must_use]
pub fn master_instruction(group: &GroupSpec, output: &OutputFormat) -> String {
    format!(
        "Recolor the garment in the first image to match the '{}' reference swatch in the second image. Preserve fabric texture, seams, shading and the subject's identity. Output at {}x{} ({}).",
        group.label, output.width, output.height, output.aspect
    )
}
