//! Raspberry Pi detection from `/proc/cpuinfo`

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};

use super::error::Result;

/// Board family prefix of every Raspberry Pi identifier
pub const RPI_FAMILY: &str = "RaspberryPi";

/// `Hardware` values reported by Raspberry Pi kernels
pub const RPI_HARDWARE: &[&str] = &[
    "BCM2708", "BCM2709", "BCM2710", "BCM2835", "BCM2836", "BCM2837",
];

/// `Revision` code to board model.
///
/// Source: <http://elinux.org/RPi_HardwareHistory#Board_Revision_History>
pub const RPI_REVISIONS: &[(&str, &str)] = &[
    ("Beta", "B (Beta) ? 256MB (Q1 2012 Beta Board)"),
    ("0002", "B 1.0 256MB (Q1 2012)"),
    ("0003", "B ECN0001 1.0 256MB (Q3 2012)"),
    ("0004", "B 2.0 256MB (Q3 2012 Sony)"),
    ("0005", "B 2.0 256MB (Q4 2012 Qisda)"),
    ("0006", "B 2.0 256MB (Q4 2012 Egoman)"),
    ("0007", "A 2.0 256MB (Q1 2013 Egoman)"),
    ("0008", "A 2.0 256MB (Q1 2013 Sony)"),
    ("0009", "A 2.0 256MB (Q1 2013 Qisda)"),
    ("000d", "B 2.0 512MB (Q4 2012 Egoman)"),
    ("000e", "B 2.0 512MB (Q4 2012 Sony)"),
    ("000f", "B 2.0 512MB (Q4 2012 Qisda)"),
    ("0010", "B+ 1.0 512MB (Q3 2014 Sony)"),
    ("0011", "Compute Module 1.0 512MB (Q2 2014 Sony)"),
    ("0012", "A+ 1.1 256MB (Q4 2014 Sony)"),
    ("0013", "B+ 1.2 512MB (Q1 2015)"),
    ("0014", "Compute Module 1.0 512MB (Q2 2014 Embest)"),
    ("0015", "A+ 1.1 256MB (Embest)"),
    ("a01041", "2 Model B 1.1 1GB (Q1 2015 Sony)"),
    ("a21041", "2 Model B 1.1 1GB (Q1 2015 Embest)"),
    ("a22042", "2 Model B 1.2 1GB (Q3 2016 Embest)"),
    ("900092", "Zero 1.2 512MB (Q4 2015 Sony)"),
    ("900093", "Zero 1.3 512MB (Q2 2016)"),
    ("9000c1", "Zero W 1.1 512MB (Q1 2017 Sony)"),
    ("a02082", "3 Model B 1.2 1024MB (Q1 2016 Sony)"),
    ("a22082", "3 Model B 1.2 1024MB (Q1 2016)"),
    ("a32082", "3 Model B 1.2 1024MB (Q4 2016 Sony Japan)"),
    ("a020d3", "3 Model B+ 1.3 1GB (Q1 2018 Sony)"),
    ("9020e0", "3 Model A+ 1.0 512MB (Q4 2018 Sony)"),
    ("a03111", "4 Model B 1.1 1GB (Q2 2019 Sony)"),
    ("b03111", "4 Model B 1.1 2GB (Q2 2019 Sony)"),
    ("c03111", "4 Model B 1.1 4GB (Q2 2019 Sony)"),
];

/// Look up the model description for a revision code (exact, case-sensitive)
pub fn rpi_model(revision: &str) -> Option<&'static str> {
    RPI_REVISIONS
        .iter()
        .find(|(code, _)| *code == revision)
        .map(|(_, model)| *model)
}

/// Source of the host's hardware description text
pub trait HardwareReader: Send + Sync {
    fn read_description(&self) -> Result<String>;
}

/// Reads the hardware description from a cpuinfo-format file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcCpuinfo {
    path: PathBuf,
}

impl ProcCpuinfo {
    pub const DEFAULT_PATH: &'static str = "/proc/cpuinfo";

    /// Read from a cpuinfo-format file somewhere other than `/proc`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ProcCpuinfo {
    fn default() -> Self {
        Self::at(Self::DEFAULT_PATH)
    }
}

impl HardwareReader for ProcCpuinfo {
    fn read_description(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// The fields of a cpuinfo blob that identify a board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardwareDescriptor {
    pub hardware_tag: Option<String>,
    pub revision_code: Option<String>,
    /// Leading zeros and spaces removed
    pub serial: Option<String>,
}

impl HardwareDescriptor {
    /// Parse `key : value` lines; keys match case-insensitively
    pub fn parse(text: &str) -> Result<Self> {
        let hardware = line_pattern("Hardware")?;
        let revision = line_pattern("Revision")?;
        let serial = line_pattern("Serial")?;

        Ok(Self {
            hardware_tag: capture(&hardware, text),
            revision_code: capture(&revision, text),
            serial: capture(&serial, text)
                .map(|s| s.trim_start_matches(['0', ' ']).to_string()),
        })
    }

    /// Build the `RaspberryPi/<model>/<serial>` identifier.
    ///
    /// Returns `None` when the hardware tag is missing or is not a Raspberry Pi.
    pub fn raspberry_pi_id(&self) -> Option<String> {
        let Some(tag) = self.hardware_tag.as_deref() else {
            tracing::debug!("Not RPi - no Hardware line");
            return None;
        };
        if !RPI_HARDWARE.contains(&tag) {
            tracing::debug!(hardware = %tag, "Not RPi");
            return None;
        }
        tracing::debug!(hardware = %tag, "Appears to be a Raspberry Pi");

        let serial = self.serial.as_deref().unwrap_or("unknown");
        let model = match self.revision_code.as_deref() {
            None => "unknown_model".to_string(),
            Some(code) => match rpi_model(code) {
                Some(model) => model.to_string(),
                None => format!("model_{}", code),
            },
        };

        Some(format!("{}/{}/{}", RPI_FAMILY, model, serial))
    }
}

fn line_pattern(key: &str) -> Result<Regex> {
    Ok(
        RegexBuilder::new(&format!(r"^[ \t]*{}[ \t]*:[ \t]*(\w+)[ \t\r]*$", key))
            .case_insensitive(true)
            .multi_line(true)
            .build()?,
    )
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
