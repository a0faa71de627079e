//! The `visiscreen init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create visiscreen.toml
    if std::path::Path::new("visiscreen.toml").exists() {
        println!("visiscreen.toml already exists, skipping.");
    } else {
        std::fs::write("visiscreen.toml", SAMPLE_CONFIG)?;
        println!("Created visiscreen.toml");
    }

    // Create example intake
    std::fs::create_dir_all("intake")?;
    let example_path = std::path::Path::new("intake/example.toml");
    if example_path.exists() {
        println!("intake/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_INTAKE)?;
        println!("Created intake/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit visiscreen.toml to choose where records are stored");
    println!("  2. Run: visiscreen validate --intake intake/example.toml");
    println!("  3. Run: visiscreen evaluate --intake intake/example.toml --export");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# visiscreen configuration

device = "Titmus V2a"
collection = "vision_screenings"
include_catch_all = true
output_dir = "./visiscreen-exports"

[evaluation]
# "reference_only" or "fold_into_failures"
visual_field_policy = "reference_only"

[store]
type = "file"
root = "./visiscreen-records"

# [store]
# type = "http"
# base_url = "https://records.example.org"
# api_key = "${VISISCREEN_API_KEY}"
# timeout_secs = 30
"#;

const EXAMPLE_INTAKE: &str = r#"[meta]
job_group = "office"
exam_date = 2025-01-15

[person]
name = "Example Worker"
hn = "000001"
age = 35
gender = "F"

[correction]
far = "glasses"
near = "none"

[far]
binocular_ok = true
va_be = 8
va_re = 7
va_le = 7
color_correct = 6
vphoria = 4
lphoria = 8

[near]
binocular_ok = true
va_be = 9
va_re = 8
va_le = 8
vphoria = 4
lphoria = 8

[visual_field]
status = "normal"
right_temporal = 85
left_temporal = 85

[symptoms]
eye_strain = false

[review]
technician = "Technician name"
physician_note = ""
"#;
