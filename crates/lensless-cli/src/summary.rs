use console::Style;
use lensless_core::capture::CaptureDiagnostics;
use lensless_core::finalize::CropSpec;
use lensless_core::pipeline::config::PipelineConfig;
use lensless_core::pipeline::PipelineOutput;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }

    fn row(&self, label: &str, value: impl std::fmt::Display) {
        println!("    {:<14}{}", self.label.apply_to(label), self.value.apply_to(value));
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!(
        "  {}",
        s.title.apply_to("\u{2550}".repeat(title.chars().count()))
    );
    println!();
}

/// Print what a run is about to do. `host` is `None` for offline runs.
pub fn print_run_summary(config: &PipelineConfig, host: Option<&str>) {
    let s = Styles::new();
    print_title(&s, "Lensless Pipeline");

    if let Some(host) = host {
        println!("  {}", s.header.apply_to("Capture"));
        s.row("Host", host);
        match &config.fp {
            Some(fp) => println!(
                "    {:<14}{}",
                s.label.apply_to("Display"),
                s.path.apply_to(fp.display())
            ),
            None => println!(
                "    {:<14}{}",
                s.label.apply_to("Display"),
                s.disabled.apply_to("skipped")
            ),
        }
        s.row("Exposure", format!("{} s", config.capture.exp));
        s.row("ISO", config.capture.iso);
        s.row("Bits", format!("{} -> {}", config.capture.nbits, config.capture.nbits_out));
        println!();
    }

    println!("  {}", s.header.apply_to("Reconstruction"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("PSF"),
        s.path.apply_to(config.camera.psf.display())
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Algorithm"),
        s.method.apply_to(&config.recon.algo)
    );
    s.row("Downsample", config.recon.downsample);
    s.row("Precision", config.recon.dtype);
    let device = if config.recon.use_accelerated {
        config.recon.device.as_str()
    } else {
        "host"
    };
    println!("    {:<14}{}", s.label.apply_to("Device"), s.method.apply_to(device));
    print_crop(&s, &config.postproc);
    println!();
}

fn print_crop(s: &Styles, crop: &CropSpec) {
    if crop.is_empty() {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Crop"),
            s.disabled.apply_to("none")
        );
        return;
    }
    if let Some([lo, hi]) = crop.crop_hor {
        s.row("Crop (hor)", format!("{lo} .. {hi}"));
    }
    if let Some([lo, hi]) = crop.crop_vert {
        s.row("Crop (vert)", format!("{lo} .. {hi}"));
    }
}

pub fn print_diagnostics(diagnostics: &CaptureDiagnostics) {
    let s = Styles::new();
    print_title(&s, "Camera Diagnostics");
    if diagnostics.is_empty() {
        println!("    {}", s.disabled.apply_to("no fields reported"));
    }
    for (key, value) in diagnostics.iter() {
        s.row(key, value);
    }
    println!();
}

pub fn print_output(output: &PipelineOutput) {
    let s = Styles::new();
    let (h, w, c) = output.image.dim();
    println!("  {}", s.header.apply_to("Result"));
    s.row("Image", format!("{w}x{h}x{c}"));
    for path in &output.written {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Wrote"),
            s.path.apply_to(path.display())
        );
    }
    println!();
}
