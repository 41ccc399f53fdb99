//! Declarative column-mapping tables for each funding-program sheet.
//!
//! Every [`ProgramKind`] has a fixed [`SheetSchema`]: the canonical field
//! list with source-header aliases, plus role markers telling the filter
//! engine and aggregator which field holds the funding amount, the state,
//! the primary date and the grouping category. The tables replace any
//! dynamic column-name guessing and are validated once at session start.

use regex::Regex;

use crate::error::{DashboardError, Result};
use crate::models::{FieldType, ProgramKind};

/// One canonical column in a sheet schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Canonical snake_case field name.
    pub name: &'static str,
    pub field_type: FieldType,
    /// Records missing this field after coercion are dropped.
    pub required: bool,
    /// Alternate source-header spellings seen across workbook revisions.
    pub aliases: &'static [&'static str],
}

/// The full declarative mapping table for one sheet.
#[derive(Debug, Clone, Copy)]
pub struct SheetSchema {
    pub kind: ProgramKind,
    /// Canonical fields in export order.
    pub fields: &'static [FieldSpec],
    /// Field holding the primary funding amount, when the sheet has one.
    pub amount_field: Option<&'static str>,
    /// Field holding the state, normalized to a USPS code.
    pub state_field: Option<&'static str>,
    /// Field holding the primary date.
    pub date_field: Option<&'static str>,
    /// Field used for grouped breakdowns (program type, segment, ...).
    pub category_field: Option<&'static str>,
}

impl SheetSchema {
    /// Position of `field` in the canonical field order.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == field)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Match a raw source header against this schema's fields.
    ///
    /// Headers are compared in canonicalized form, so `"Award_Amount_USD"`,
    /// `"Award Amount (USD)"` and `"award amount usd"` all land on the same
    /// field. Returns the field index, or `None` for an unmapped column.
    pub fn match_field(&self, header: &str) -> Option<usize> {
        let wanted = canonical_header(header);
        if wanted.is_empty() {
            return None;
        }
        self.fields.iter().position(|f| {
            canonical_header(f.name) == wanted
                || f.aliases.iter().any(|a| canonical_header(a) == wanted)
        })
    }

    /// Check the table for internal consistency.
    ///
    /// Rejects empty field lists, duplicate canonical names, aliases that
    /// collide (with each other or with a canonical name), role markers
    /// naming unknown fields, and role markers with the wrong value type.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(self.invalid("schema has no fields"));
        }
        if !self.fields.iter().any(|f| f.required) {
            return Err(self.invalid("schema has no required fields"));
        }

        let mut seen: Vec<String> = Vec::new();
        for field in self.fields {
            let canonical = canonical_header(field.name);
            if seen.contains(&canonical) {
                return Err(self.invalid(&format!("duplicate field '{}'", field.name)));
            }
            seen.push(canonical);
        }
        for field in self.fields {
            for alias in field.aliases {
                let canonical = canonical_header(alias);
                if seen.contains(&canonical) {
                    return Err(
                        self.invalid(&format!("alias '{}' collides with another column", alias))
                    );
                }
                seen.push(canonical);
            }
        }

        self.validate_role(self.amount_field, FieldType::Number, "amount_field")?;
        self.validate_role(self.date_field, FieldType::Date, "date_field")?;
        if let Some(name) = self.state_field {
            if self.field(name).is_none() {
                return Err(self.invalid(&format!("state_field '{}' is not a field", name)));
            }
        }
        if let Some(name) = self.category_field {
            if self.field(name).is_none() {
                return Err(self.invalid(&format!("category_field '{}' is not a field", name)));
            }
        }

        Ok(())
    }

    fn validate_role(
        &self,
        role: Option<&'static str>,
        expected: FieldType,
        label: &str,
    ) -> Result<()> {
        let Some(name) = role else {
            return Ok(());
        };
        match self.field(name) {
            None => Err(self.invalid(&format!("{} '{}' is not a field", label, name))),
            Some(f) if f.field_type != expected => Err(self.invalid(&format!(
                "{} '{}' must be {}, got {}",
                label, name, expected, f.field_type
            ))),
            Some(_) => Ok(()),
        }
    }

    fn invalid(&self, message: &str) -> DashboardError {
        DashboardError::InvalidSchema {
            dataset: self.kind.sheet_name().to_string(),
            message: message.to_string(),
        }
    }
}

/// Canonicalize a header for matching: lowercase, collapse every run of
/// non-alphanumeric characters to a single underscore, trim the ends.
pub fn canonical_header(raw: &str) -> String {
    let re = Regex::new(r"[^a-z0-9]+").expect("regex is valid");
    let lower = raw.trim().to_lowercase();
    re.replace_all(&lower, "_").trim_matches('_').to_string()
}

/// The mapping table for `kind`.
pub fn schema_for(kind: ProgramKind) -> &'static SheetSchema {
    match kind {
        ProgramKind::EmergencyConnectivity => &EMERGENCY_CONNECTIVITY,
        ProgramKind::ERate => &ERATE,
        ProgramKind::PublicHousing => &PUBLIC_HOUSING,
        ProgramKind::Lifeline => &LIFELINE,
        ProgramKind::FederalGrants => &FEDERAL_GRANTS,
        ProgramKind::TribalFunding => &TRIBAL_FUNDING,
        ProgramKind::TribalPriorityCapital => &TRIBAL_PRIORITY_CAPITAL,
        ProgramKind::NonprofitWifi => &NONPROFIT_WIFI,
        ProgramKind::MarketingIntelligence => &MARKETING_INTELLIGENCE,
        ProgramKind::IndustryNews => &INDUSTRY_NEWS,
    }
}

/// Validate every registered mapping table. Called once at session start so a
/// bad table fails loudly instead of silently mis-mapping columns.
pub fn validate_all() -> Result<()> {
    for kind in ProgramKind::ALL {
        schema_for(kind).validate()?;
    }
    Ok(())
}

// ── Mapping tables ────────────────────────────────────────────────────────────

static EMERGENCY_CONNECTIVITY: SheetSchema = SheetSchema {
    kind: ProgramKind::EmergencyConnectivity,
    fields: &[
        FieldSpec {
            name: "applicant_name",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Billed Entity Name"],
        },
        FieldSpec {
            name: "state",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Billed Entity State"],
        },
        FieldSpec {
            name: "funding_amount",
            field_type: FieldType::Number,
            required: true,
            aliases: &["FRN Approved Amount", "Approved Amount"],
        },
        FieldSpec {
            name: "funding_request_date",
            field_type: FieldType::Date,
            required: false,
            aliases: &["FCDL Date"],
        },
        FieldSpec {
            name: "applicant_type",
            field_type: FieldType::Text,
            required: false,
            aliases: &["Entity Type"],
        },
    ],
    amount_field: Some("funding_amount"),
    state_field: Some("state"),
    date_field: Some("funding_request_date"),
    category_field: Some("applicant_type"),
};

static ERATE: SheetSchema = SheetSchema {
    kind: ProgramKind::ERate,
    fields: &[
        FieldSpec {
            name: "applicant_name",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Organization Name"],
        },
        FieldSpec {
            name: "state",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Applicant State"],
        },
        FieldSpec {
            name: "funding_amount",
            field_type: FieldType::Number,
            required: true,
            aliases: &["Total Funding", "Funding Commitment"],
        },
        FieldSpec {
            name: "funding_year",
            field_type: FieldType::Number,
            required: false,
            aliases: &[],
        },
        FieldSpec {
            name: "service_type",
            field_type: FieldType::Text,
            required: false,
            aliases: &["Service Category"],
        },
    ],
    amount_field: Some("funding_amount"),
    state_field: Some("state"),
    date_field: None,
    category_field: Some("service_type"),
};

static PUBLIC_HOUSING: SheetSchema = SheetSchema {
    kind: ProgramKind::PublicHousing,
    fields: &[
        FieldSpec {
            name: "development_name",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Development"],
        },
        FieldSpec {
            name: "state",
            field_type: FieldType::Text,
            required: true,
            aliases: &["State Code"],
        },
        FieldSpec {
            name: "funding_amount",
            field_type: FieldType::Number,
            required: true,
            aliases: &["Award_Amount_USD", "Award Amount"],
        },
        FieldSpec {
            name: "connected",
            field_type: FieldType::Bool,
            required: false,
            aliases: &[],
        },
        FieldSpec {
            name: "in_building_wifi",
            field_type: FieldType::Bool,
            required: false,
            aliases: &[],
        },
        FieldSpec {
            name: "award_date",
            field_type: FieldType::Date,
            required: false,
            aliases: &[],
        },
    ],
    amount_field: Some("funding_amount"),
    state_field: Some("state"),
    date_field: Some("award_date"),
    category_field: None,
};

static LIFELINE: SheetSchema = SheetSchema {
    kind: ProgramKind::Lifeline,
    fields: &[
        FieldSpec {
            name: "provider_name",
            field_type: FieldType::Text,
            required: true,
            aliases: &["ETC Name"],
        },
        FieldSpec {
            name: "state",
            field_type: FieldType::Text,
            required: true,
            aliases: &[],
        },
        FieldSpec {
            name: "support_amount",
            field_type: FieldType::Number,
            required: true,
            aliases: &["Disbursement Amount"],
        },
        FieldSpec {
            name: "subscriber_count",
            field_type: FieldType::Number,
            required: false,
            aliases: &["Subscribers"],
        },
    ],
    amount_field: Some("support_amount"),
    state_field: Some("state"),
    date_field: None,
    category_field: None,
};

static FEDERAL_GRANTS: SheetSchema = SheetSchema {
    kind: ProgramKind::FederalGrants,
    fields: &[
        FieldSpec {
            name: "program_name",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Grant Program"],
        },
        FieldSpec {
            name: "agency",
            field_type: FieldType::Text,
            required: false,
            aliases: &["Awarding Agency"],
        },
        FieldSpec {
            name: "state",
            field_type: FieldType::Text,
            required: true,
            aliases: &[],
        },
        FieldSpec {
            name: "funding_amount",
            field_type: FieldType::Number,
            required: true,
            aliases: &["Grant Amount", "Award Amount"],
        },
        FieldSpec {
            name: "award_date",
            field_type: FieldType::Date,
            required: false,
            aliases: &[],
        },
    ],
    amount_field: Some("funding_amount"),
    state_field: Some("state"),
    date_field: Some("award_date"),
    category_field: Some("agency"),
};

static TRIBAL_FUNDING: SheetSchema = SheetSchema {
    kind: ProgramKind::TribalFunding,
    fields: &[
        FieldSpec {
            name: "tribe_name",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Tribal Entity"],
        },
        FieldSpec {
            name: "state",
            field_type: FieldType::Text,
            required: true,
            aliases: &[],
        },
        FieldSpec {
            name: "funding_amount",
            field_type: FieldType::Number,
            required: true,
            aliases: &["Award Amount"],
        },
        FieldSpec {
            name: "program_type",
            field_type: FieldType::Text,
            required: false,
            aliases: &["Program"],
        },
    ],
    amount_field: Some("funding_amount"),
    state_field: Some("state"),
    date_field: None,
    category_field: Some("program_type"),
};

static TRIBAL_PRIORITY_CAPITAL: SheetSchema = SheetSchema {
    kind: ProgramKind::TribalPriorityCapital,
    fields: &[
        FieldSpec {
            name: "project_name",
            field_type: FieldType::Text,
            required: true,
            aliases: &[],
        },
        FieldSpec {
            name: "state",
            field_type: FieldType::Text,
            required: true,
            aliases: &[],
        },
        FieldSpec {
            name: "funding_amount",
            field_type: FieldType::Number,
            required: true,
            aliases: &["Capital Amount"],
        },
        FieldSpec {
            name: "status",
            field_type: FieldType::Text,
            required: false,
            aliases: &["Project Status"],
        },
    ],
    amount_field: Some("funding_amount"),
    state_field: Some("state"),
    date_field: None,
    category_field: Some("status"),
};

static NONPROFIT_WIFI: SheetSchema = SheetSchema {
    kind: ProgramKind::NonprofitWifi,
    fields: &[
        FieldSpec {
            name: "organization_name",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Organization"],
        },
        FieldSpec {
            name: "state",
            field_type: FieldType::Text,
            required: false,
            aliases: &[],
        },
        FieldSpec {
            name: "annual_spending",
            field_type: FieldType::Number,
            required: true,
            aliases: &["Annual WiFi Spend"],
        },
        FieldSpec {
            name: "focus_area",
            field_type: FieldType::Text,
            required: false,
            aliases: &[],
        },
    ],
    amount_field: Some("annual_spending"),
    state_field: Some("state"),
    date_field: None,
    category_field: Some("focus_area"),
};

static MARKETING_INTELLIGENCE: SheetSchema = SheetSchema {
    kind: ProgramKind::MarketingIntelligence,
    fields: &[
        FieldSpec {
            name: "company_name",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Company"],
        },
        FieldSpec {
            name: "segment",
            field_type: FieldType::Text,
            required: false,
            aliases: &["Market Segment"],
        },
        FieldSpec {
            name: "state",
            field_type: FieldType::Text,
            required: false,
            aliases: &["HQ State"],
        },
        FieldSpec {
            name: "estimated_value",
            field_type: FieldType::Number,
            required: false,
            aliases: &["Opportunity Value"],
        },
        FieldSpec {
            name: "last_contact",
            field_type: FieldType::Date,
            required: false,
            aliases: &["Last Contact Date"],
        },
    ],
    amount_field: Some("estimated_value"),
    state_field: Some("state"),
    date_field: Some("last_contact"),
    category_field: Some("segment"),
};

static INDUSTRY_NEWS: SheetSchema = SheetSchema {
    kind: ProgramKind::IndustryNews,
    fields: &[
        FieldSpec {
            name: "headline",
            field_type: FieldType::Text,
            required: true,
            aliases: &["Title"],
        },
        FieldSpec {
            name: "source",
            field_type: FieldType::Text,
            required: false,
            aliases: &["Publication"],
        },
        FieldSpec {
            name: "published_date",
            field_type: FieldType::Date,
            required: false,
            aliases: &["Date"],
        },
        FieldSpec {
            name: "url",
            field_type: FieldType::Text,
            required: false,
            aliases: &["Link"],
        },
    ],
    amount_field: None,
    state_field: None,
    date_field: Some("published_date"),
    category_field: Some("source"),
};

// ── Tests ─────────────────────────────────────────────────────────────────────
