use std::sync::Arc;

use ndarray::Axis;

use crate::types::CepstralFrame;

use super::CepstralAnalysis;

/// Expand one token's `K × T` matrix into `T` rows, one per analysis frame.
pub fn build_frame_rows(obs_id: &Arc<str>, analysis: &CepstralAnalysis) -> Vec<CepstralFrame> {
    let frame_count = analysis.frame_count();
    analysis
        .coefficients
        .axis_iter(Axis(1))
        .enumerate()
        .map(|(timestep, column)| CepstralFrame {
            obs_id: Arc::clone(obs_id),
            timestep,
            frame_count,
            duration: analysis.duration,
            coefficients: column.to_vec(),
        })
        .collect()
}
