/// File stem the remote capture script writes to, relative to the remote home.
pub const REMOTE_CAPTURE_STEM: &str = "remote_capture";

/// Remote path the display target image is copied to before capture.
pub const REMOTE_DISPLAY_PATH: &str = "~/LenslessPiCam_display/test.png";

/// Diagnostic lines this short or shorter carry no `key: value` pair.
pub const MIN_DIAGNOSTIC_LINE_LEN: usize = 3;

/// Diagnostic key carrying the red auto-white-balance gain.
pub const RED_GAIN_KEY: &str = "Red gain";

/// Diagnostic key carrying the blue auto-white-balance gain.
pub const BLUE_GAIN_KEY: &str = "Blue gain";

/// Default SSH port used when checking that the remote host resolves.
pub const SSH_PORT: u16 = 22;

/// Square window (start, end) in pixels used to estimate the PSF background.
pub const PSF_BACKGROUND_WINDOW: (usize, usize) = (5, 25);

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;

/// FISTA step size numerator (`scale / max |H|^2`). Values above 1 can diverge.
pub const FISTA_STEP_SCALE: f64 = 1.0;

/// Minimum rows (or columns) in a plane before the parallel backend splits FFT work.
pub const PARALLEL_LINE_THRESHOLD: usize = 64;

/// Number of histogram bins rendered in `histogram.png`.
pub const HISTOGRAM_BINS: usize = 256;

/// Height in pixels of the rendered histogram image.
pub const HISTOGRAM_HEIGHT: u32 = 256;

/// Persisted output file names.
pub const RAW_PLOT_FILENAME: &str = "raw.png";
pub const HISTOGRAM_FILENAME: &str = "histogram.png";
pub const PSF_PLOT_FILENAME: &str = "psf.png";
pub const RECONSTRUCTED_FILENAME: &str = "reconstructed.png";

/// ITU-R BT.601 luminance weights, used to collapse an RGB PSF for gray captures.
pub const LUMINANCE_R: f32 = 0.299;
pub const LUMINANCE_G: f32 = 0.587;
pub const LUMINANCE_B: f32 = 0.114;
