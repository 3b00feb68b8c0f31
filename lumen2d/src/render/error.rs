use thiserror::Error;

/// Errors surfaced by the lighting pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A light or lighting layer was drawn before its producing render
    /// pass completed. Sequencing bug in the caller, not recoverable.
    #[error("light was drawn before it was rendered")]
    LightNotRendered,

    /// The backend kept refusing a render-target attachment. The current
    /// lighting rebuild is aborted; state has been rolled back.
    #[error("failed to attach a render target after {attempts} attempts")]
    TargetAllocation { attempts: u32 },

    /// A texture pass was finished while rendering to the screen.
    #[error("no offscreen render pass is active")]
    PassNotActive,

    /// Encoding or writing a texture snapshot failed.
    #[error("texture snapshot failed: {0}")]
    Snapshot(#[from] image::ImageError),
}
