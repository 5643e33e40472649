/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Maximum value of an 8-bit channel.
pub const MAX_PIXEL: f64 = 255.0;

/// Number of channels in a color frame.
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Number of histogram bins for 8-bit CLAHE.
pub const HISTOGRAM_BINS: usize = 256;

/// Default CLAHE tile grid (tiles per axis).
pub const DEFAULT_CLAHE_TILE_GRID: usize = 8;

/// CLAHE clip limit for still images.
pub const IMAGE_CLAHE_CLIP_LIMIT: f32 = 3.0;

/// CLAHE clip limit for the per-frame video path.
pub const VIDEO_CLAHE_CLIP_LIMIT: f32 = 2.0;

/// Bilateral filter neighbourhood diameter (pixels).
pub const DEFAULT_BILATERAL_DIAMETER: usize = 9;

/// Bilateral filter color and spatial sigma.
pub const DEFAULT_BILATERAL_SIGMA: f32 = 75.0;

/// Gaussian sigma of the blurred copy used by unsharp masking.
pub const DEFAULT_UNSHARP_SIGMA: f32 = 2.0;

/// Fraction of `x - blurred` added back by unsharp masking
/// (`x + 0.5 * (x - blurred)` is `1.5 * x - 0.5 * blurred`).
pub const DEFAULT_UNSHARP_AMOUNT: f32 = 0.5;

/// Weight of the high-pass sharpened frame when blended with its input.
pub const DEFAULT_HIGH_PASS_BLEND: f32 = 0.3;

/// 3x3 high-pass sharpening kernel used by the video preset.
pub const HIGH_PASS_KERNEL: [[f32; 3]; 3] = [[-1.0, -1.0, -1.0], [-1.0, 9.0, -1.0], [-1.0, -1.0, -1.0]];

/// Gamma applied by the still-image preset.
pub const DEFAULT_GAMMA: f32 = 1.2;

/// SSIM Gaussian window side length.
pub const SSIM_WINDOW: usize = 11;

/// SSIM Gaussian window sigma.
pub const SSIM_SIGMA: f32 = 1.5;

/// SSIM stabilization constant C1 = (0.01 * 255)^2.
pub const SSIM_C1: f64 = (0.01 * MAX_PIXEL) * (0.01 * MAX_PIXEL);

/// SSIM stabilization constant C2 = (0.03 * 255)^2.
pub const SSIM_C2: f64 = (0.03 * MAX_PIXEL) * (0.03 * MAX_PIXEL);

/// UIQM weight for the contrast term.
pub const UIQM_CONTRAST_WEIGHT: f64 = 100.0;

/// UIQM weight for the saturation term.
pub const UIQM_SATURATION_WEIGHT: f64 = 50.0;

/// UIQM divisor for the Laplacian-variance sharpness term.
pub const UIQM_SHARPNESS_DIVISOR: f64 = 100.0;

/// UIQM weight for the colorfulness term.
pub const UIQM_COLORFULNESS_WEIGHT: f64 = 25.0;

/// Square input side expected by the enhancement network.
pub const NEURAL_INPUT_SIZE: u32 = 512;
