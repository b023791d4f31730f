//! Sample exports. Each one lands in the region as `ex_<name>(...)`.

use cmdexport::export;

#[export]
pub fn add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

#[export]
pub fn echo(message: &str) -> String {
    message.to_string()
}

/// Entry names in `path`, sorted.
#[export]
pub fn dirlist(path: &str) -> Result<Vec<String>, std::io::Error> {
    let mut names = std::fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    names.sort();
    Ok(names)
}

#[export]
pub fn checked_div(a: u64, b: u64) -> Result<u64, String> {
    a.checked_div(b).ok_or_else(|| "division by zero".to_string())
}

#[export]
pub fn mean(samples: Vec<f64>) -> Result<f64, String> {
    if samples.is_empty() {
        return Err("no samples".to_string());
    }
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

#[export]
pub fn brightness(pixel: [u8; 3]) -> u8 {
    let [r, g, b] = pixel.map(u32::from);
    ((r * 299 + g * 587 + b * 114) / 1000) as u8
}
