//! # Dataset Interchange
//!
//! Flat CSV exchange of a wall section: one row per anchor, the project
//! values flattened into plain columns, and the full project serialized as
//! JSON into the reserved `geo_json` column of every row.
//!
//! ## Layout
//!
//! ```text
//! x1,y1,angle,free,bond,prestress,strands,strand_area,drill_mm,alpha,shear_stress,fs,
//! section_name,y_excav,L_excav,y_wall,limit_x,borehole_id,borehole_x,esp,afast,
//! A_inf,A_strand,delta_L,E,geo_json
//! ```
//!
//! ## Import Tolerance
//!
//! Files come back from spreadsheets and older tools, so the importer
//! accepts:
//!
//! - headers in any case, with spaces or punctuation, and legacy names
//!   (`angulo`, `livre`, `bolbo`, `L_free (m)`, `Prestress (kN)`, ...)
//! - `,` `;` tab or `|` as delimiter, sniffed from the header line
//! - CRLF line ends, a UTF-8 byte order mark, Latin-1 encoded bytes
//! - decimal commas in numeric cells, empty or `nan` cells as missing
//! - payloads written with single quotes, and legacy payload keys
//!   (`l_excav`, `a_inf`) in any case
//!
//! Rows lacking a required field (`x1 y1 angle free bond`) are skipped and
//! reported as [`CalcError::MalformedRecord`]. A missing or unreadable
//! payload falls back to the defaults plus the flattened columns and is
//! reported as [`CalcError::MalformedPayload`]. A flattened project column
//! that cannot be read is reported per column in `column_errors`. None of
//! these stops the import.
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::interchange::{export_csv, import_csv};
//! use anchor_core::project::{Anchor, ProjectGlobals};
//!
//! let anchors = vec![Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0)];
//! let globals = ProjectGlobals::default();
//!
//! let bytes = export_csv(&anchors, &globals)?;
//! let outcome = import_csv(&bytes)?;
//!
//! assert_eq!(outcome.dataset.anchors, anchors);
//! assert_eq!(outcome.dataset.globals, globals);
//! assert!(outcome.is_clean());
//! # Ok::<(), anchor_core::errors::CalcError>(())
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{CalcError, CalcResult};
use crate::project::{
    Anchor, Dataset, ProjectGlobals, StratumLayer, DEFAULT_ALPHA, DEFAULT_DRILL_DIAMETER_MM,
    DEFAULT_PRESTRESS_KN, DEFAULT_SAFETY_FACTOR, DEFAULT_SHEAR_STRESS_KPA, DEFAULT_STRAND_COUNT,
};

/// Reserved column holding the JSON project payload
pub const PAYLOAD_COLUMN: &str = "geo_json";

/// Anchor columns in export order
pub const ANCHOR_COLUMNS: [&str; 12] = [
    "x1",
    "y1",
    "angle",
    "free",
    "bond",
    "prestress",
    "strands",
    "strand_area",
    "drill_mm",
    "alpha",
    "shear_stress",
    "fs",
];

/// Anchor columns a row cannot be imported without
pub const REQUIRED_COLUMNS: [&str; 5] = ["x1", "y1", "angle", "free", "bond"];

/// Flattened project columns in export order
pub const GLOBAL_COLUMNS: [&str; 13] = [
    "section_name",
    "y_excav",
    "L_excav",
    "y_wall",
    "limit_x",
    "borehole_id",
    "borehole_x",
    "esp",
    "afast",
    "A_inf",
    "A_strand",
    "delta_L",
    "E",
];

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Normalized header aliases, keyed by canonical anchor column
const ALIASES: &[(&str, &[&str])] = &[
    ("x1", &["x1", "x", "x_1", "head_x", "head_x_m", "x_m"]),
    ("y1", &["y1", "y", "y_1", "head_y", "head_y_m", "y_m"]),
    ("angle", &["angle", "angle_deg", "ang", "angulo", "inclination", "inclinacao"]),
    (
        "free",
        &["free", "free_length", "free_length_m", "l_free", "l_free_m", "livre", "l_livre", "comprimento_livre"],
    ),
    (
        "bond",
        &["bond", "bond_length", "bond_length_m", "l_bond", "l_bond_m", "bolbo", "l_bolbo", "comprimento_bolbo"],
    ),
    ("prestress", &["prestress", "prestress_kn", "preesforco", "pre_esforco", "preesforco_kn"]),
    ("strands", &["strands", "strand_count", "n_strands", "cordoes", "n_cordoes"]),
    ("strand_area", &["strand_area", "strand_area_mm2", "area_cordao"]),
    ("drill_mm", &["drill_mm", "drill", "drill_diameter", "drill_diameter_mm", "furo", "diametro_furo"]),
    ("alpha", &["alpha", "alfa"]),
    ("shear_stress", &["shear_stress", "shear_stress_kpa", "tau", "tau_kpa"]),
    ("fs", &["fs", "f_s", "safety_factor", "fator_seguranca"]),
];

/// Result of an import: the dataset plus everything that was dropped on the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub dataset: Dataset,

    /// One `MalformedRecord` per skipped row
    pub skipped: Vec<CalcError>,

    /// Set when the payload was absent or unreadable
    pub payload_error: Option<CalcError>,

    /// One `MalformedRecord` per flattened project column that could not be applied
    pub column_errors: Vec<CalcError>,

    /// Delimiter detected from the header line
    pub delimiter: char,
}

impl ImportOutcome {
    /// Check if nothing was skipped or defaulted
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.payload_error.is_none() && self.column_errors.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct PayloadLayer<'a> {
    name: &'a str,
    y: f64,
    #[serde(rename = "L")]
    l: f64,
}

/// Project payload as written into `geo_json`
#[derive(Debug, Serialize)]
struct GeoPayload<'a> {
    section_name: &'a str,
    y_excav: f64,
    #[serde(rename = "L_excav")]
    l_excav: f64,
    y_wall: f64,
    limit_x: f64,
    stratigraphy: Vec<PayloadLayer<'a>>,
    borehole_id: &'a str,
    borehole_x: f64,
    esp: f64,
    afast: f64,
    #[serde(rename = "A_inf")]
    a_inf: f64,
    #[serde(rename = "A_strand")]
    a_strand: f64,
    #[serde(rename = "delta_L")]
    delta_l: f64,
    #[serde(rename = "E")]
    e: f64,
}

impl<'a> From<&'a ProjectGlobals> for GeoPayload<'a> {
    fn from(g: &'a ProjectGlobals) -> Self {
        GeoPayload {
            section_name: &g.section_name,
            y_excav: g.excavation_bottom_m,
            l_excav: g.excavation_extent_m,
            y_wall: g.wall_top_m,
            limit_x: g.boundary_x_m,
            stratigraphy: g
                .stratigraphy
                .iter()
                .map(|layer| PayloadLayer {
                    name: &layer.name,
                    y: layer.elevation_m,
                    l: layer.extent_m,
                })
                .collect(),
            borehole_id: &g.borehole.id,
            borehole_x: g.borehole.x_m,
            esp: g.wall_thickness_m,
            afast: g.anchor_spacing_m,
            a_inf: g.influence_area_m,
            a_strand: g.strand_area_mm2,
            delta_l: g.wedge_slip_mm,
            e: g.steel_modulus_mpa,
        }
    }
}

impl GeoPayload<'_> {
    /// Scalar values in `GLOBAL_COLUMNS` order
    fn flattened(&self) -> [String; 13] {
        [
            self.section_name.to_string(),
            self.y_excav.to_string(),
            self.l_excav.to_string(),
            self.y_wall.to_string(),
            self.limit_x.to_string(),
            self.borehole_id.to_string(),
            self.borehole_x.to_string(),
            self.esp.to_string(),
            self.afast.to_string(),
            self.a_inf.to_string(),
            self.a_strand.to_string(),
            self.delta_l.to_string(),
            self.e.to_string(),
        ]
    }
}

// =============================================================================
// EXPORT
// =============================================================================

/// Write a section to CSV bytes (UTF-8, comma-delimited, `.` decimals).
///
/// Numbers use the shortest decimal form that parses back to the same value.
/// A section without anchors is written as a single row with empty anchor
/// cells, so its project values survive the trip.
pub fn export_csv(anchors: &[Anchor], globals: &ProjectGlobals) -> CalcResult<Vec<u8>> {
    let payload = GeoPayload::from(globals);
    let payload_json = serde_json::to_string(&payload)?;
    let flattened = payload.flattened();

    let mut writer = csv::Writer::from_writer(Vec::new());

    let header = ANCHOR_COLUMNS
        .iter()
        .chain(GLOBAL_COLUMNS.iter())
        .chain(std::iter::once(&PAYLOAD_COLUMN));
    writer.write_record(header)?;

    if anchors.is_empty() {
        writer.write_record(
            ANCHOR_COLUMNS
                .iter()
                .map(|_| "")
                .chain(flattened.iter().map(String::as_str))
                .chain(std::iter::once(payload_json.as_str())),
        )?;
    }

    for anchor in anchors {
        let cells = [
            anchor.head.x.to_string(),
            anchor.head.y.to_string(),
            anchor.angle_deg.to_string(),
            anchor.free_length_m.to_string(),
            anchor.bond_length_m.to_string(),
            anchor.prestress_kn.to_string(),
            anchor.strand_count.to_string(),
            anchor.strand_area_mm2.map(|a| a.to_string()).unwrap_or_default(),
            anchor.drill_diameter_mm.to_string(),
            anchor.alpha.to_string(),
            anchor.shear_stress_kpa.to_string(),
            anchor.safety_factor.to_string(),
        ];
        writer.write_record(
            cells
                .iter()
                .map(String::as_str)
                .chain(flattened.iter().map(String::as_str))
                .chain(std::iter::once(payload_json.as_str())),
        )?;
    }

    let bytes = writer.into_inner().map_err(|e| CalcError::SerializationError {
        reason: e.to_string(),
    })?;
    debug!(anchors = anchors.len(), bytes = bytes.len(), "exported section");
    Ok(bytes)
}

/// Write a dataset to CSV bytes.
pub fn export_dataset(dataset: &Dataset) -> CalcResult<Vec<u8>> {
    export_csv(&dataset.anchors, &dataset.globals)
}

// =============================================================================
// IMPORT
// =============================================================================

/// Read a section from CSV bytes.
///
/// Only an unreadable file is an error. Bad rows and a bad payload are
/// reported in the returned [`ImportOutcome`].
pub fn import_csv(bytes: &[u8]) -> CalcResult<ImportOutcome> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = decode(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(text.as_str());
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns = column_map(reader.headers()?);
    let col = |name: &str| columns.get(name).copied();

    let mut anchors = Vec::new();
    let mut skipped = Vec::new();
    let mut first_record: Option<(usize, csv::StringRecord)> = None;

    for (i, record) in reader.records().enumerate() {
        let row = i + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(row, "skipping unreadable row: {}", e);
                skipped.push(CalcError::malformed_record(row, "*", e.to_string()));
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }

        // A row with no anchor cells only carries project values
        let has_anchor = ANCHOR_COLUMNS
            .iter()
            .any(|&name| col(name).and_then(|i| cell(&record, i)).is_some());
        if has_anchor {
            match parse_anchor(&record, &col, row) {
                Ok(anchor) => anchors.push(anchor),
                Err(error) => {
                    warn!(row, code = error.error_code(), "skipping row: {}", error);
                    skipped.push(error);
                }
            }
        }
        if first_record.is_none() {
            first_record = Some((row, record));
        }
    }

    let mut globals = ProjectGlobals::default();
    let mut column_errors = Vec::new();

    if let Some((row, record)) = &first_record {
        for &name in GLOBAL_COLUMNS.iter() {
            let key = normalize_header(name);
            if let Some(raw) = col(&key).and_then(|i| cell(record, i)) {
                let value = match key.as_str() {
                    "section_name" | "borehole_id" => Value::String(raw.to_string()),
                    _ => match parse_number(raw) {
                        Some(n) => Value::from(n),
                        None => {
                            column_errors.push(CalcError::malformed_record(
                                *row,
                                name,
                                format!("not a number: '{}'", raw),
                            ));
                            continue;
                        }
                    },
                };
                if let Err(reason) = apply_global(&mut globals, &key, &value) {
                    column_errors.push(CalcError::malformed_record(*row, name, reason));
                }
            }
        }
    }
    for error in &column_errors {
        warn!(code = error.error_code(), "ignoring project column: {}", error);
    }

    let payload_cell = first_record
        .as_ref()
        .and_then(|(_, record)| col(PAYLOAD_COLUMN).and_then(|i| cell(record, i)));

    let payload_error = match payload_cell {
        None => Some(CalcError::malformed_payload("no project payload found")),
        Some(raw) => match parse_payload(raw) {
            Ok(map) => {
                let mut problems = Vec::new();
                for (key, value) in &map {
                    if let Err(reason) = apply_global(&mut globals, key, value) {
                        problems.push(reason);
                    }
                }
                if problems.is_empty() {
                    None
                } else {
                    Some(CalcError::malformed_payload(problems.join("; ")))
                }
            }
            Err(reason) => Some(CalcError::malformed_payload(reason)),
        },
    };
    if let Some(error) = &payload_error {
        warn!("using default project values: {}", error);
    }

    debug!(
        anchors = anchors.len(),
        skipped = skipped.len(),
        delimiter = ?(delimiter as char),
        "imported section"
    );

    Ok(ImportOutcome {
        dataset: Dataset { globals, anchors },
        skipped,
        payload_error,
        column_errors,
        delimiter: delimiter as char,
    })
}

/// UTF-8 if valid, otherwise Latin-1 (every byte is a code point)
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Pick the candidate delimiter that occurs most often, outside quotes, on the
/// first non-empty line. Ties go to the earlier candidate; no hit means comma.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");

    let mut counts = [0usize; DELIMITERS.len()];
    let mut in_quotes = false;
    for b in header.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(i) = DELIMITERS.iter().position(|&d| d == b) {
                counts[i] += 1;
            }
        }
    }

    let mut best = 0;
    for i in 1..DELIMITERS.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    DELIMITERS[best]
}

/// Lowercase, fold accents, and collapse every run of other characters to `_`.
fn normalize_header(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.trim().chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

/// Canonical column for a normalized header, if it is one we read
fn canonical(normalized: &str) -> Option<String> {
    if let Some((name, _)) = ALIASES.iter().find(|(_, aliases)| aliases.contains(&normalized)) {
        return Some((*name).to_string());
    }
    let is_global = GLOBAL_COLUMNS.iter().any(|g| normalize_header(g) == normalized);
    if is_global || normalized == PAYLOAD_COLUMN {
        return Some(normalized.to_string());
    }
    None
}

/// Canonical column name to record index; the first occurrence wins
fn column_map(headers: &csv::StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (i, header) in headers.iter().enumerate() {
        let normalized = normalize_header(header);
        match canonical(&normalized) {
            Some(name) => {
                map.entry(name).or_insert(i);
            }
            None if !normalized.is_empty() => debug!(column = header, "ignoring unknown column"),
            None => {}
        }
    }
    map
}

/// Non-empty, non-`nan` cell content
fn cell(record: &csv::StringRecord, index: usize) -> Option<&str> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("nan"))
}

/// Parse a finite number, accepting a decimal comma
fn parse_number(raw: &str) -> Option<f64> {
    let value = raw.parse::<f64>().ok().or_else(|| {
        if raw.contains(',') && !raw.contains('.') {
            raw.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    })?;
    value.is_finite().then_some(value)
}

fn parse_anchor<F>(record: &csv::StringRecord, col: &F, row: usize) -> CalcResult<Anchor>
where
    F: Fn(&str) -> Option<usize>,
{
    let raw = |name: &str| col(name).and_then(|i| cell(record, i));

    let number = |name: &str| -> CalcResult<Option<f64>> {
        match raw(name) {
            None => Ok(None),
            Some(s) => parse_number(s)
                .map(Some)
                .ok_or_else(|| CalcError::malformed_record(row, name, format!("not a number: '{}'", s))),
        }
    };
    let required = |name: &str| -> CalcResult<f64> {
        number(name)?.ok_or_else(|| CalcError::malformed_record(row, name, "missing value"))
    };

    let mut anchor = Anchor::new(
        required("x1")?,
        required("y1")?,
        required("angle")?,
        required("free")?,
        required("bond")?,
    );

    anchor.prestress_kn = number("prestress")?.unwrap_or(DEFAULT_PRESTRESS_KN);
    anchor.strand_count = match number("strands")? {
        None => DEFAULT_STRAND_COUNT,
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => n as u32,
        Some(n) => {
            return Err(CalcError::malformed_record(
                row,
                "strands",
                format!("not a whole number of strands: {}", n),
            ))
        }
    };
    anchor.strand_area_mm2 = number("strand_area")?;
    anchor.drill_diameter_mm = number("drill_mm")?.unwrap_or(DEFAULT_DRILL_DIAMETER_MM);
    anchor.alpha = number("alpha")?.unwrap_or(DEFAULT_ALPHA);
    anchor.shear_stress_kpa = number("shear_stress")?.unwrap_or(DEFAULT_SHEAR_STRESS_KPA);
    anchor.safety_factor = number("fs")?.unwrap_or(DEFAULT_SAFETY_FACTOR);

    Ok(anchor)
}

/// Parse the payload into a map with lowercased keys.
///
/// Falls back to swapping single quotes for double quotes once.
fn parse_payload(raw: &str) -> Result<Vec<(String, Value)>, String> {
    let value: Value = serde_json::from_str(raw)
        .or_else(|_| serde_json::from_str(&raw.replace('\'', "\"")))
        .map_err(|e| format!("payload is not valid JSON: {}", e))?;

    match value {
        Value::Object(map) => Ok(map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()),
        other => Err(format!("payload is not a JSON object: {}", other)),
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s.trim()),
        _ => None,
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Apply one project value under its lowercased payload key.
///
/// Unknown keys are ignored; a known key with the wrong type is an error.
fn apply_global(globals: &mut ProjectGlobals, key: &str, value: &Value) -> Result<(), String> {
    if value.is_null() {
        return Ok(());
    }
    let number = || value_as_f64(value).ok_or_else(|| format!("'{}' is not a number: {}", key, value));
    let text = || value_as_string(value).ok_or_else(|| format!("'{}' is not text: {}", key, value));

    match key {
        "section_name" => globals.section_name = text()?,
        "y_excav" => globals.excavation_bottom_m = number()?,
        "l_excav" => globals.excavation_extent_m = number()?,
        "y_wall" => globals.wall_top_m = number()?,
        "limit_x" => globals.boundary_x_m = number()?,
        "borehole_id" => globals.borehole.id = text()?,
        "borehole_x" => globals.borehole.x_m = number()?,
        "esp" => globals.wall_thickness_m = number()?,
        "afast" => globals.anchor_spacing_m = number()?,
        "a_inf" => globals.influence_area_m = number()?,
        "a_strand" => globals.strand_area_mm2 = number()?,
        "delta_l" => globals.wedge_slip_mm = number()?,
        "e" => globals.steel_modulus_mpa = number()?,
        "stratigraphy" => globals.stratigraphy = parse_stratigraphy(value)?,
        _ => {}
    }
    Ok(())
}

fn parse_stratigraphy(value: &Value) -> Result<Vec<StratumLayer>, String> {
    let layers = value
        .as_array()
        .ok_or_else(|| format!("'stratigraphy' is not a list: {}", value))?;

    layers
        .iter()
        .enumerate()
        .map(|(i, layer)| -> Result<StratumLayer, String> {
            let fields: HashMap<String, &Value> = layer
                .as_object()
                .ok_or_else(|| format!("stratigraphy layer {} is not an object", i + 1))?
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect();
            let number = |key: &str| {
                fields
                    .get(key)
                    .and_then(|v| value_as_f64(v))
                    .ok_or_else(|| format!("stratigraphy layer {}: '{}' missing or not a number", i + 1, key))
            };
            Ok(StratumLayer {
                name: fields.get("name").and_then(|v| value_as_string(v)).unwrap_or_default(),
                elevation_m: number("y")?,
                extent_m: number("l")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_globals() -> ProjectGlobals {
        ProjectGlobals {
            section_name: "Section B-B, east".to_string(),
            excavation_bottom_m: -1.5,
            wall_top_m: 7.25,
            stratigraphy: vec![
                StratumLayer {
                    name: "Fill".to_string(),
                    elevation_m: 6.0,
                    extent_m: 18.0,
                },
                StratumLayer {
                    name: "Clay \"C2\"".to_string(),
                    elevation_m: 2.3,
                    extent_m: 20.0,
                },
            ],
            anchor_spacing_m: 2.5,
            ..ProjectGlobals::default()
        }
    }

    fn sample_anchors() -> Vec<Anchor> {
        vec![
            Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0),
            Anchor::new(0.0, 5.5, -30.0, 8.5, 7.0)
                .with_prestress(350.0)
                .with_strands(4, Some(150.0))
                .with_bond(175.0, 1.2, 220.0, 2.0),
            Anchor::new(0.1, 3.0, 0.1 + 0.2, 12.0, 6.0),
        ]
    }

    #[test]
    fn test_round_trip() {
        let bytes = export_csv(&sample_anchors(), &sample_globals()).unwrap();
        let outcome = import_csv(&bytes).unwrap();

        assert!(outcome.is_clean(), "{:?}", outcome);
        assert_eq!(outcome.delimiter, ',');
        assert_eq!(outcome.dataset.anchors, sample_anchors());
        assert_eq!(outcome.dataset.globals, sample_globals());
    }

    #[test]
    fn test_export_header_and_payload() {
        let bytes = export_csv(&sample_anchors(), &ProjectGlobals::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("x1,y1,angle,free,bond,prestress,strands,strand_area,"));
        assert!(header.ends_with(",E,geo_json"));

        // Default strand area is written as an empty cell
        let first = lines.next().unwrap();
        assert!(first.starts_with("0,8,-25,10,10,100,3,,150,1.4,150,1.8,Section 1,"));
        assert!(first.contains("\"\"A_inf\"\":1.5"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_missing_required_field_skips_row() {
        let csv = "x1,y1,angle,free,bond\n0,8,-25,10,10\n0,6,-25,10,\n0,4,-25,9,8\n";
        let outcome = import_csv(csv.as_bytes()).unwrap();

        assert_eq!(outcome.dataset.anchors.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        match &outcome.skipped[0] {
            CalcError::MalformedRecord { row, field, .. } => {
                assert_eq!(*row, 2);
                assert_eq!(field, "bond");
            }
            other => panic!("unexpected error {:?}", other),
        }
        // Optional fields defaulted
        assert_eq!(outcome.dataset.anchors[1].prestress_kn, DEFAULT_PRESTRESS_KN);
        assert_eq!(outcome.dataset.anchors[1].head.y, 4.0);
    }

    #[test]
    fn test_unparsable_value_skips_row() {
        let csv = "x1,y1,angle,free,bond,prestress\n0,8,-25,10,10,abc\n0,4,-25,9,8,200\n";
        let outcome = import_csv(csv.as_bytes()).unwrap();
        assert_eq!(outcome.dataset.anchors.len(), 1);
        assert!(matches!(
            &outcome.skipped[0],
            CalcError::MalformedRecord { field, .. } if field == "prestress"
        ));
    }

    #[test]
    fn test_semicolon_decimal_comma_crlf_bom() {
        let csv = "\u{feff}X1;Y1;Angle;Free;Bond;FS\r\n0;8,5;-25;10;10;1,5\r\n";
        let outcome = import_csv(csv.as_bytes()).unwrap();

        assert_eq!(outcome.delimiter, ';');
        let anchor = &outcome.dataset.anchors[0];
        assert_eq!(anchor.head.y, 8.5);
        assert_eq!(anchor.safety_factor, 1.5);
    }

    #[test]
    fn test_legacy_headers() {
        let csv = "x1\ty1\tangulo\tL_free (m)\tbolbo\tPrestress (kN)\tN strands\n\
                   1\t8\t-20\t11\t9\t250\t5\n";
        let outcome = import_csv(csv.as_bytes()).unwrap();

        assert_eq!(outcome.delimiter, '\t');
        let anchor = &outcome.dataset.anchors[0];
        assert_eq!(anchor.angle_deg, -20.0);
        assert_eq!(anchor.free_length_m, 11.0);
        assert_eq!(anchor.bond_length_m, 9.0);
        assert_eq!(anchor.prestress_kn, 250.0);
        assert_eq!(anchor.strand_count, 5);
    }

    #[test]
    fn test_latin1_header() {
        // "ângulo" in Latin-1
        let mut bytes = b"x1|y1|".to_vec();
        bytes.extend_from_slice(&[0xE2]);
        bytes.extend_from_slice(b"ngulo|livre|bond\n0|8|-25|10|10\n");

        let outcome = import_csv(&bytes).unwrap();
        assert_eq!(outcome.delimiter, '|');
        assert_eq!(outcome.dataset.anchors.len(), 1);
        assert_eq!(outcome.dataset.anchors[0].angle_deg, -25.0);
    }

    #[test]
    fn test_single_quoted_payload_and_legacy_keys() {
        let csv = "x1,y1,angle,free,bond,geo_json\n\
                   0,8,-25,10,10,\"{'section_name': 'Old', 'l_excav': 7.5, 'a_inf': 2.0, \
                   'stratigraphy': [{'name': 'Sand', 'y': 4.0, 'L': 15.0}]}\"\n";
        let outcome = import_csv(csv.as_bytes()).unwrap();

        assert!(outcome.payload_error.is_none(), "{:?}", outcome.payload_error);
        let g = &outcome.dataset.globals;
        assert_eq!(g.section_name, "Old");
        assert_eq!(g.excavation_extent_m, 7.5);
        assert_eq!(g.influence_area_m, 2.0);
        assert_eq!(g.stratigraphy.len(), 1);
        assert_eq!(g.stratigraphy[0].extent_m, 15.0);
        // Keys absent from the payload keep their defaults
        assert_eq!(g.anchor_spacing_m, 3.0);
    }

    #[test]
    fn test_bad_payload_falls_back_to_columns() {
        let csv = "x1,y1,angle,free,bond,afast,esp,geo_json\n0,8,-25,10,10,2.0,0.4,{not json\n";
        let outcome = import_csv(csv.as_bytes()).unwrap();

        assert_eq!(outcome.dataset.anchors.len(), 1);
        assert!(matches!(outcome.payload_error, Some(CalcError::MalformedPayload { .. })));
        assert_eq!(outcome.dataset.globals.anchor_spacing_m, 2.0);
        assert_eq!(outcome.dataset.globals.wall_thickness_m, 0.4);
        assert_eq!(outcome.dataset.globals.section_name, "Section 1");
    }

    #[test]
    fn test_absent_payload_reported() {
        let outcome = import_csv(b"x1,y1,angle,free,bond\n0,8,-25,10,10\n").unwrap();
        assert!(matches!(outcome.payload_error, Some(CalcError::MalformedPayload { .. })));
        assert_eq!(outcome.dataset.globals, ProjectGlobals::default());
    }

    #[test]
    fn test_round_trip_is_exact_for_long_floats() {
        let anchors = vec![Anchor::new(9.063077870366499, 4.226182617406994, -25.0, 10.0, 10.0)];
        let globals = ProjectGlobals {
            wall_top_m: 9.063077870366499,
            influence_area_m: 0.1 + 0.2,
            stratigraphy: vec![StratumLayer {
                name: "Sand".to_string(),
                elevation_m: 4.226182617406994,
                extent_m: 1.0 / 3.0,
            }],
            ..ProjectGlobals::default()
        };

        let outcome = import_csv(&export_csv(&anchors, &globals).unwrap()).unwrap();
        assert!(outcome.is_clean(), "{:?}", outcome);
        assert_eq!(outcome.dataset.anchors, anchors);
        assert_eq!(outcome.dataset.globals, globals);
    }

    #[test]
    fn test_empty_section_keeps_project_values() {
        let bytes = export_csv(&[], &sample_globals()).unwrap();
        assert_eq!(String::from_utf8(bytes.clone()).unwrap().lines().count(), 2);

        let outcome = import_csv(&bytes).unwrap();
        assert!(outcome.is_clean(), "{:?}", outcome);
        assert!(outcome.dataset.anchors.is_empty());
        assert_eq!(outcome.dataset.globals, sample_globals());
    }

    #[test]
    fn test_bom_with_latin1_body() {
        // UTF-8 byte order mark followed by a Latin-1 "ângulo" header
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"x1;y1;");
        bytes.extend_from_slice(&[0xE2]);
        bytes.extend_from_slice(b"ngulo;livre;bond\n0;8;-25;10;10\n");

        let outcome = import_csv(&bytes).unwrap();
        assert!(outcome.skipped.is_empty(), "{:?}", outcome.skipped);
        assert_eq!(outcome.dataset.anchors.len(), 1);
        assert_eq!(outcome.dataset.anchors[0].angle_deg, -25.0);
    }

    #[test]
    fn test_bad_column_reported_apart_from_payload() {
        let csv = "x1,y1,angle,free,bond,afast,geo_json\n\
                   0,8,-25,10,10,wide,\"{\"\"esp\"\": 0.5}\"\n";
        let outcome = import_csv(csv.as_bytes()).unwrap();

        assert!(outcome.payload_error.is_none(), "{:?}", outcome.payload_error);
        assert_eq!(outcome.dataset.globals.wall_thickness_m, 0.5);
        assert_eq!(outcome.column_errors.len(), 1);
        assert!(matches!(
            &outcome.column_errors[0],
            CalcError::MalformedRecord { row: 1, field, .. } if field == "afast"
        ));
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_bad_column_reported_without_payload() {
        let csv = "x1,y1,angle,free,bond,esp\n0,8,-25,10,10,thick\n";
        let outcome = import_csv(csv.as_bytes()).unwrap();

        assert!(matches!(outcome.payload_error, Some(CalcError::MalformedPayload { .. })));
        assert_eq!(outcome.column_errors.len(), 1);
        assert_eq!(outcome.dataset.globals.wall_thickness_m, ProjectGlobals::default().wall_thickness_m);
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  L_free (m) "), "l_free_m");
        assert_eq!(normalize_header("Prestress (kN)"), "prestress_kn");
        assert_eq!(normalize_header("Pré-esforço"), "pre_esforco");
        assert_eq!(normalize_header("A_inf"), "a_inf");
    }

    #[test]
    fn test_sniff_ignores_quoted_delimiters() {
        assert_eq!(sniff_delimiter("\"a;b;c\",x,y\n"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n"), b';');
        assert_eq!(sniff_delimiter("single\n"), b',');
    }
}
