use std::fmt::Write;

/// One line-protocol record: `<measurement>,<tag>=<value> <field>=<number>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tag_key: String,
    pub tag_value: String,
    pub field: String,
    pub value: f64,
}

pub const USAGE_FIELD: &str = "usage";
pub const CORE_TAG: &str = "core";

impl Point {
    pub fn usage(measurement: &str, tag_value: impl Into<String>, value: f64) -> Self {
        Self {
            measurement: measurement.to_string(),
            tag_key: CORE_TAG.to_string(),
            tag_value: tag_value.into(),
            field: USAGE_FIELD.to_string(),
            value,
        }
    }

    pub fn write_line(&self, out: &mut String) {
        escape_into(out, &self.measurement, &[',', ' ']);
        out.push(',');
        escape_into(out, &self.tag_key, &[',', '=', ' ']);
        out.push('=');
        escape_into(out, &self.tag_value, &[',', '=', ' ']);
        out.push(' ');
        escape_into(out, &self.field, &[',', '=', ' ']);
        let _ = write!(out, "={:.6}", self.value);
    }

    pub fn to_line(&self) -> String {
        let mut out = String::new();
        self.write_line(&mut out);
        out
    }
}

fn escape_into(out: &mut String, raw: &str, special: &[char]) {
    for ch in raw.chars() {
        if special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
}

/// Newline-separated request body for a batch of points.
pub fn encode_batch(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 40);
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        point.write_line(&mut out);
    }
    out
}
