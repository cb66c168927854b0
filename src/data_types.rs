/*!
 * Record types for BloomAPI responses
 *
 * Each record keeps the JSON object it was decoded from and projects typed
 * values out of it on demand. Nested objects (addresses, identifiers,
 * specialties, officials) are only decoded when their accessor is called.
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use chrono::NaiveDate;

/// A decoded JSON object backing a record
pub type RawObject = Map<String, Value>;

/// Read-only access to the JSON object behind a record
///
/// The provided methods are pure projections of [`JsonRecord::raw`], so any
/// top-level field the server sent can be read even when no dedicated
/// accessor exists for it.
pub trait JsonRecord {
    /// The JSON object this record was built from
    fn raw(&self) -> &RawObject;

    /// Raw value of a top-level field
    fn field(&self, key: &str) -> Option<&Value> {
        self.raw().get(key)
    }

    /// Field value if it is a JSON string
    fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Field rendered as text; numbers are accepted as well as strings
    fn text_field(&self, key: &str) -> Option<String> {
        match self.field(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Field interpreted as a yes/no flag
    fn flag_field(&self, key: &str) -> Option<bool> {
        match self.field(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "yes" | "y" | "true" => Some(true),
                "no" | "n" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Field interpreted as a calendar date
    ///
    /// Accepts plain `YYYY-MM-DD` dates and ISO-8601 timestamps such as
    /// `2005-05-23T00:00:00.000Z`; only the date part is kept.
    fn date_field(&self, key: &str) -> Option<NaiveDate> {
        let text = self.str_field(key)?;
        let date_part = text.get(..10)?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}

/// Decode a field holding a nested object
fn nested_object<T>(raw: &RawObject, key: &str, build: fn(RawObject) -> T) -> Option<T> {
    raw.get(key)
        .and_then(Value::as_object)
        .map(|obj| build(obj.clone()))
}

/// Decode a field holding a list of objects; a lone object counts as a list of one
fn nested_list<T>(raw: &RawObject, key: &str, build: fn(RawObject) -> T) -> Vec<T> {
    match raw.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|obj| build(obj.clone()))
            .collect(),
        Some(Value::Object(obj)) => vec![build(obj.clone())],
        _ => Vec::new(),
    }
}

fn join_name_parts(parts: &[Option<&str>], credential: Option<&str>) -> String {
    let mut out: Vec<String> = parts
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(credential) = credential.filter(|c| !c.trim().is_empty()) {
        out.push(format!("({})", credential.trim()));
    }

    out.join(" ")
}

/// Provider kind selected by the `type` discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Individual,
    Organization,
}

impl EntityType {
    /// Match a `type` discriminator value; unknown values yield `None`
    pub fn from_discriminator(value: &str) -> Option<Self> {
        match value {
            "individual" => Some(EntityType::Individual),
            "organization" => Some(EntityType::Organization),
            _ => None,
        }
    }

    pub fn as_discriminator(&self) -> &'static str {
        match self {
            EntityType::Individual => "individual",
            EntityType::Organization => "organization",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Individual => write!(f, "Individual"),
            EntityType::Organization => write!(f, "Organization"),
        }
    }
}

pub trait OptionDisplay {
    fn option_display(&self) -> String;
}

impl OptionDisplay for Option<EntityType> {
    fn option_display(&self) -> String {
        match self {
            Some(entity_type) => entity_type.to_string(),
            None => "Provider".to_string(),
        }
    }
}

/// Mailing or practice address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Address {
    raw: RawObject,
}

impl JsonRecord for Address {
    fn raw(&self) -> &RawObject {
        &self.raw
    }
}

impl Address {
    pub fn new(raw: RawObject) -> Self {
        Self { raw }
    }

    pub fn address_line(&self) -> Option<&str> {
        self.str_field("address_line")
    }

    pub fn address_details_line(&self) -> Option<&str> {
        self.str_field("address_details_line")
    }

    pub fn city(&self) -> Option<&str> {
        self.str_field("city")
    }

    pub fn state(&self) -> Option<&str> {
        self.str_field("state")
    }

    /// Postal code; some records carry it as a number
    pub fn zip(&self) -> Option<String> {
        self.text_field("zip")
    }

    pub fn country_code(&self) -> Option<&str> {
        self.str_field("country_code")
    }

    pub fn phone(&self) -> Option<String> {
        self.text_field("phone")
    }

    pub fn fax(&self) -> Option<String> {
        self.text_field("fax")
    }

    /// Check if the address has no street, city, state, or postal code
    pub fn is_empty(&self) -> bool {
        self.address_line().is_none()
            && self.address_details_line().is_none()
            && self.city().is_none()
            && self.state().is_none()
            && self.zip().is_none()
    }

    /// Format as a single line address
    pub fn single_line(&self) -> String {
        let mut parts = Vec::new();

        if let Some(line1) = self.address_line() {
            parts.push(line1.to_string());
        }
        if let Some(line2) = self.address_details_line() {
            parts.push(line2.to_string());
        }
        if let Some(city) = self.city() {
            parts.push(city.to_string());
        }
        if let Some(state) = self.state() {
            parts.push(state.to_string());
        }
        if let Some(zip) = self.zip() {
            parts.push(zip);
        }

        parts.join(", ")
    }
}

/// Other provider identifier (Medicaid number, UPIN, and so on)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier {
    raw: RawObject,
}

impl JsonRecord for Identifier {
    fn raw(&self) -> &RawObject {
        &self.raw
    }
}

impl Identifier {
    pub fn new(raw: RawObject) -> Self {
        Self { raw }
    }

    pub fn identifier(&self) -> Option<String> {
        self.text_field("identifier")
    }

    pub fn identifier_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    pub fn state(&self) -> Option<&str> {
        self.str_field("state")
    }

    pub fn issuer(&self) -> Option<&str> {
        self.str_field("issuer")
    }
}

/// Healthcare provider taxonomy entry
///
/// Appears both in a provider's `provider_details` and in the
/// `nucc_taxonomy_codes` of a Medicare specialty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Specialty {
    raw: RawObject,
}

impl JsonRecord for Specialty {
    fn raw(&self) -> &RawObject {
        &self.raw
    }
}

impl Specialty {
    pub fn new(raw: RawObject) -> Self {
        Self { raw }
    }

    /// Taxonomy code (e.g. `2086X0206X`)
    pub fn code(&self) -> Option<&str> {
        self.str_field("code")
            .or_else(|| self.str_field("healthcare_taxonomy_code"))
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    pub fn license_number(&self) -> Option<String> {
        self.text_field("license_number")
    }

    pub fn license_state(&self) -> Option<&str> {
        self.str_field("license_number_state")
    }

    /// Whether this is the provider's primary taxonomy
    pub fn is_primary(&self) -> bool {
        self.flag_field("taxonomy_switch").unwrap_or(false)
    }
}

/// Medicare provider/supplier type mapped to NUCC taxonomy codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicareSpecialty {
    raw: RawObject,
}

impl JsonRecord for MedicareSpecialty {
    fn raw(&self) -> &RawObject {
        &self.raw
    }
}

impl MedicareSpecialty {
    pub fn new(raw: RawObject) -> Self {
        Self { raw }
    }

    /// Medicare specialty code
    pub fn code(&self) -> Option<&str> {
        self.str_field("code")
    }

    /// Medicare provider/supplier type description
    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    /// Taxonomy codes this specialty maps to
    pub fn nucc_taxonomy_codes(&self) -> Vec<Specialty> {
        nested_list(&self.raw, "nucc_taxonomy_codes", Specialty::new)
    }
}

/// Fields shared by every provider record
///
/// Also used on its own when the `type` discriminator is missing or not
/// recognised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provider {
    raw: RawObject,
}

impl JsonRecord for Provider {
    fn raw(&self) -> &RawObject {
        &self.raw
    }
}

impl Provider {
    pub fn new(raw: RawObject) -> Self {
        Self { raw }
    }

    /// National Provider Identifier; the API sends it as a number
    pub fn npi(&self) -> Option<String> {
        self.text_field("npi")
    }

    /// Raw `type` discriminator
    pub fn provider_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    pub fn enumeration_date(&self) -> Option<NaiveDate> {
        self.date_field("enumeration_date")
    }

    pub fn last_update_date(&self) -> Option<NaiveDate> {
        self.date_field("last_update_date")
    }

    pub fn deactivation_date(&self) -> Option<NaiveDate> {
        self.date_field("deactivation_date")
    }

    pub fn deactivation_reason(&self) -> Option<&str> {
        self.str_field("deactivation_reason")
    }

    pub fn reactivation_date(&self) -> Option<NaiveDate> {
        self.date_field("reactivation_date")
    }

    pub fn replacement_npi(&self) -> Option<String> {
        self.text_field("replacement_npi")
    }

    pub fn business_address(&self) -> Option<Address> {
        nested_object(&self.raw, "business_address", Address::new)
    }

    pub fn practice_address(&self) -> Option<Address> {
        nested_object(&self.raw, "practice_address", Address::new)
    }

    pub fn identifiers(&self) -> Vec<Identifier> {
        nested_list(&self.raw, "other_identifiers", Identifier::new)
    }

    pub fn specialties(&self) -> Vec<Specialty> {
        nested_list(&self.raw, "provider_details", Specialty::new)
    }

    /// The specialty flagged as primary, if any
    pub fn primary_specialty(&self) -> Option<Specialty> {
        self.specialties().into_iter().find(Specialty::is_primary)
    }

    /// Not deactivated, or reactivated after the last deactivation
    pub fn is_active(&self) -> bool {
        match (self.deactivation_date(), self.reactivation_date()) {
            (None, _) => true,
            (Some(deactivated), Some(reactivated)) => reactivated >= deactivated,
            (Some(_), None) => false,
        }
    }
}

/// Individual practitioner (`type == "individual"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Individual {
    provider: Provider,
}

impl JsonRecord for Individual {
    fn raw(&self) -> &RawObject {
        self.provider.raw()
    }
}

impl Individual {
    pub fn new(raw: RawObject) -> Self {
        Self { provider: Provider::new(raw) }
    }

    /// Shared provider fields
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn first_name(&self) -> Option<&str> {
        self.str_field("first_name")
    }

    pub fn middle_name(&self) -> Option<&str> {
        self.str_field("middle_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        self.str_field("last_name")
    }

    pub fn name_prefix(&self) -> Option<&str> {
        self.str_field("name_prefix")
    }

    pub fn name_suffix(&self) -> Option<&str> {
        self.str_field("name_suffix")
    }

    pub fn credential(&self) -> Option<&str> {
        self.str_field("credential")
    }

    pub fn gender(&self) -> Option<&str> {
        self.str_field("gender")
    }

    pub fn sole_proprietor(&self) -> Option<bool> {
        self.flag_field("sole_proprietor")
    }

    /// Format the full name, including prefix, suffix and credential
    pub fn full_name(&self) -> String {
        join_name_parts(
            &[
                self.name_prefix(),
                self.first_name(),
                self.middle_name(),
                self.last_name(),
                self.name_suffix(),
            ],
            self.credential(),
        )
    }
}

/// Person holding an official role within an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationOfficial {
    raw: RawObject,
}

impl JsonRecord for OrganizationOfficial {
    fn raw(&self) -> &RawObject {
        &self.raw
    }
}

impl OrganizationOfficial {
    pub fn new(raw: RawObject) -> Self {
        Self { raw }
    }

    pub fn first_name(&self) -> Option<&str> {
        self.str_field("first_name")
    }

    pub fn middle_name(&self) -> Option<&str> {
        self.str_field("middle_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        self.str_field("last_name")
    }

    pub fn name_prefix(&self) -> Option<&str> {
        self.str_field("name_prefix")
    }

    pub fn name_suffix(&self) -> Option<&str> {
        self.str_field("name_suffix")
    }

    pub fn credential(&self) -> Option<&str> {
        self.str_field("credential")
    }

    /// Role within the organization (e.g. "CEO")
    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn phone(&self) -> Option<String> {
        self.text_field("phone")
    }

    pub fn full_name(&self) -> String {
        join_name_parts(
            &[
                self.name_prefix(),
                self.first_name(),
                self.middle_name(),
                self.last_name(),
                self.name_suffix(),
            ],
            self.credential(),
        )
    }
}

/// Healthcare organization (`type == "organization"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Organization {
    provider: Provider,
}

impl JsonRecord for Organization {
    fn raw(&self) -> &RawObject {
        self.provider.raw()
    }
}

impl Organization {
    pub fn new(raw: RawObject) -> Self {
        Self { provider: Provider::new(raw) }
    }

    /// Shared provider fields
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Legal business name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn other_name(&self) -> Option<&str> {
        self.str_field("other_name")
    }

    pub fn employer_identification_number(&self) -> Option<String> {
        self.text_field("employer_identification_number")
    }

    pub fn is_subpart(&self) -> Option<bool> {
        self.flag_field("is_organization_subpart")
    }

    pub fn parent_organization_name(&self) -> Option<&str> {
        self.str_field("parent_organization_legal_business_name")
    }

    pub fn parent_organization_tin(&self) -> Option<String> {
        self.text_field("parent_organization_tin")
    }

    /// Authorized officials; the registry sends one object or a list
    pub fn officials(&self) -> Vec<OrganizationOfficial> {
        nested_list(self.raw(), "organization_official", OrganizationOfficial::new)
    }
}

/// Any record returned by the NPI endpoints, selected by its `type` field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderRecord {
    Individual(Individual),
    Organization(Organization),
    /// Fallback for a missing or unrecognised discriminator
    Provider(Provider),
}

impl JsonRecord for ProviderRecord {
    fn raw(&self) -> &RawObject {
        self.provider().raw()
    }
}

impl ProviderRecord {
    /// Shared provider fields, whatever the concrete kind
    pub fn provider(&self) -> &Provider {
        match self {
            ProviderRecord::Individual(individual) => individual.provider(),
            ProviderRecord::Organization(organization) => organization.provider(),
            ProviderRecord::Provider(provider) => provider,
        }
    }

    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            ProviderRecord::Individual(_) => Some(EntityType::Individual),
            ProviderRecord::Organization(_) => Some(EntityType::Organization),
            ProviderRecord::Provider(_) => None,
        }
    }

    pub fn as_individual(&self) -> Option<&Individual> {
        match self {
            ProviderRecord::Individual(individual) => Some(individual),
            _ => None,
        }
    }

    pub fn as_organization(&self) -> Option<&Organization> {
        match self {
            ProviderRecord::Organization(organization) => Some(organization),
            _ => None,
        }
    }

    pub fn npi(&self) -> Option<String> {
        self.provider().npi()
    }

    /// Get the record's primary name based on its kind
    pub fn display_name(&self) -> String {
        match self {
            ProviderRecord::Individual(individual) => {
                format!("{} {}",
                    individual.first_name().unwrap_or(""),
                    individual.last_name().unwrap_or("")
                ).trim().to_string()
            },
            ProviderRecord::Organization(organization) => {
                organization.name()
                    .unwrap_or("Unknown Organization")
                    .to_string()
            },
            ProviderRecord::Provider(_) => "Unknown".to_string(),
        }
    }
}
