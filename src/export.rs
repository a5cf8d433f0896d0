//! Tabular export of scored leads.

use crate::core::error::Result;
use crate::core::models::ScoredLead;

use clap::ValueEnum;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// One CSV row per lead, header from the field names.
pub fn write_csv<W: Write>(writer: W, leads: &[ScoredLead]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for lead in leads {
        csv_writer.serialize(lead)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Pretty-printed JSON array.
pub fn write_json<W: Write>(mut writer: W, leads: &[ScoredLead]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, leads)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn export_leads(path: &Path, format: ExportFormat, leads: &[ScoredLead]) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Csv => write_csv(writer, leads)?,
        ExportFormat::Json => write_json(writer, leads)?,
    }
    tracing::info!("Wrote {} lead(s) to {}", leads.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::LeadSource;

    fn sample() -> Vec<ScoredLead> {
        vec![ScoredLead {
            name: "Jane Doe".into(),
            role: "VP Marketing, EMEA".into(),
            email: Some("jane@acme.co".into()),
            source: LeadSource::Pattern,
            lead_score: 85,
            company_name: "Acme".into(),
            company_domain: "acme.co".into(),
            mx_ok: true,
            pattern: Some("{first}@{domain}".into()),
            wappalyzer_status: "skip".into(),
            firmographics_status: "skip".into(),
            ..ScoredLead::default()
        }]
    }

    #[test]
    fn test_csv_header_and_row() {
        let mut out = Vec::new();
        write_csv(&mut out, &sample()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("name,role,email,source,lead_score,company_name"));
        assert!(header.ends_with("smtp_verified"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Jane Doe,\"VP Marketing, EMEA\",jane@acme.co,pattern,85,Acme"));
        // Unverified leads leave the column empty.
        assert!(row.ends_with(','));
    }

    #[test]
    fn test_export_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.json");
        export_leads(&path, ExportFormat::Json, &sample()).unwrap();
        let parsed: Vec<ScoredLead> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, sample());
    }
}
