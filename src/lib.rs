/*!
 * # BloomAPI Client Library
 *
 * A Rust client for looking up healthcare providers through the
 * [BloomAPI](http://www.bloomapi.com/) NPI registry.
 *
 * ## Features
 *
 * - **Provider search**: equality filters on any registry field, with limit/offset paging
 * - **NPI lookup**: fetch one individual or organization by National Provider Identifier
 * - **Specialty crosswalk**: map NUCC taxonomy codes to Medicare specialty codes
 * - **Typed records**: individuals, organizations, addresses, identifiers and specialties
 * - **Explicit errors**: transport, HTTP status, malformed body and not-found failures are distinct
 * - **Export**: JSON, JSON Lines and CSV output of fetched records
 *
 * ## Quick Start
 *
 * ```no_run
 * use bloom_api::prelude::*;
 *
 * # fn main() -> Result<()> {
 * let config = ConfigBuilder::new()
 *     .api_key("my-secret-key")
 *     .build();
 * let client = BloomClient::with_config(config)?;
 *
 * // Search by any registry field
 * let criteria = Criteria::new()
 *     .equals("last_name", "SMITH")
 *     .equals("practice_address.state", "NY");
 *
 * for record in client.find_by(&criteria, 20, 0)? {
 *     println!("{} {}", record.npi().unwrap_or_default(), record.display_name());
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Looking Up a Single Provider
 *
 * ```no_run
 * # use bloom_api::prelude::*;
 * # fn main() -> Result<()> {
 * # let client = BloomClient::with_config(BloomConfig::default())?;
 * match client.find_by_npi("1234567890") {
 *     Ok(ProviderRecord::Individual(person)) => println!("{}", person.full_name()),
 *     Ok(ProviderRecord::Organization(org)) => println!("{}", org.name().unwrap_or("")),
 *     Ok(ProviderRecord::Provider(other)) => println!("{:?}", other.raw()),
 *     Err(e) if e.is_not_found() => println!("no such provider"),
 *     Err(e) => return Err(e),
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Medicare Specialties
 *
 * ```no_run
 * # use bloom_api::prelude::*;
 * # fn main() -> Result<()> {
 * # let client = BloomClient::with_config(BloomConfig::default())?;
 * for specialty in client.find_by_specialty_code("2086S0122X")? {
 *     println!("{:?}: {:?}", specialty.code(), specialty.description());
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Configuration
 *
 * The client takes its configuration when it is built. `BloomConfig::load()`
 * merges `~/.config/bloom-api/config.toml` with `BLOOM_*` environment
 * variables; scripts can also install a global once:
 *
 * ```no_run
 * # use bloom_api::prelude::*;
 * # fn main() -> Result<()> {
 * bloom_api::config::set_api_key("my-secret-key");
 * let client = BloomClient::new()?;
 * # Ok(())
 * # }
 * ```
 */

// Re-export error types from root
pub use error::{BloomError, Result, ExportFormat};
pub use client::{BloomClient, Criteria};

// Public modules
pub mod data_types;
pub mod response;
pub mod client;
pub mod error;
pub mod export;
pub mod config;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use bloom_api::prelude::*;
/// ```
pub mod prelude {
    pub use crate::data_types::*;
    pub use crate::client::{BloomClient, Criteria};
    pub use crate::error::{BloomError, Result};
    pub use crate::export::{RecordExporter, JsonExporter, CsvExporter};
    pub use crate::config::{BloomConfig, ConfigBuilder};
    pub use crate::ExportFormat;
}

/// Registry field names commonly used in search criteria
pub mod fields {
    pub const NPI: &str = "npi";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const ORGANIZATION_NAME: &str = "name";
    pub const ENTITY_TYPE: &str = "type";
    pub const PRACTICE_STATE: &str = "practice_address.state";
    pub const PRACTICE_CITY: &str = "practice_address.city";
    pub const PRACTICE_ZIP: &str = "practice_address.zip";
    pub const TAXONOMY_CODE: &str = "provider_details.healthcare_taxonomy_code";
}

/// Common recipes built on the client
pub mod cookbook {
    use crate::prelude::*;
    use crate::fields;

    /// Find individual practitioners by last name within a state
    ///
    /// # Example
    /// ```no_run
    /// # use bloom_api::prelude::*;
    /// # use bloom_api::cookbook::find_individuals_in_state;
    /// # fn main() -> Result<()> {
    /// # let client = BloomClient::with_config(BloomConfig::default())?;
    /// let smiths = find_individuals_in_state(&client, "SMITH", "NY")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn find_individuals_in_state(
        client: &BloomClient,
        last_name: &str,
        state: &str,
    ) -> Result<Vec<Individual>> {
        let criteria = Criteria::new()
            .equals(fields::LAST_NAME, last_name)
            .equals(fields::PRACTICE_STATE, state)
            .equals(fields::ENTITY_TYPE, EntityType::Individual.as_discriminator());

        let individuals = client.search(&criteria)?
            .into_iter()
            .filter_map(|record| match record {
                ProviderRecord::Individual(individual) => Some(individual),
                _ => None,
            })
            .collect();

        Ok(individuals)
    }

    /// Find providers practicing under a taxonomy code in a state
    pub fn find_by_taxonomy_in_state(
        client: &BloomClient,
        taxonomy_code: &str,
        state: &str,
        limit: u32,
    ) -> Result<Vec<ProviderRecord>> {
        let criteria = Criteria::new()
            .equals(fields::TAXONOMY_CODE, taxonomy_code)
            .equals(fields::PRACTICE_STATE, state);
        client.find_by(&criteria, limit, 0)
    }

    /// Medicare specialty codes for a provider's primary taxonomy
    ///
    /// Returns an empty list when the provider has no primary taxonomy.
    pub fn medicare_specialties_for(
        client: &BloomClient,
        record: &ProviderRecord,
    ) -> Result<Vec<MedicareSpecialty>> {
        let primary = record.provider().primary_specialty();
        match primary.as_ref().and_then(Specialty::code) {
            Some(code) => client.find_by_specialty_code(code),
            None => Ok(Vec::new()),
        }
    }
}
