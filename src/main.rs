// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Rockhound: Local AI Rock Identifier & Collection Manager

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use rockhound::chat::{Conversation, OllamaChat};
use rockhound::collection::{Collection, RecordStore};
use rockhound::config::AppConfig;
use rockhound::filter::{self, FilterState, LUSTERS, MOHS_SCALE, ROCK_TYPES};
use rockhound::geology::geocode::GeocodeClient;
use rockhound::geology::macrostrat::MacrostratClient;
use rockhound::geology::{self, RockDetails, SuggestionReport};
use rockhound::identify::vision::{is_supported_image, Identifier, VisionIdentifier};
use rockhound::identify::IdentificationResult;
use rockhound::kv::SqliteKv;
use rockhound::ollama::OllamaClient;
use rockhound::record::Record;
use rockhound::{Result, RockhoundError};

/// Rockhound CLI - Local AI Rock Identifier
#[derive(Parser, Debug)]
#[command(name = "rockhound")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Identify rocks with a local vision model and keep a searchable collection", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "rockhound.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Identify a rock from one or more photos
    Identify {
        /// Photos of the same specimen
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Save the identification to the collection
        #[arg(long)]
        save: bool,

        /// Notes stored with the saved record
        #[arg(long)]
        notes: Option<String>,

        /// Where the specimen was found
        #[arg(long)]
        location: Option<String>,

        /// Latitude used to look up the location when --location is absent
        #[arg(long, allow_hyphen_values = true, requires = "lng")]
        lat: Option<f64>,

        /// Longitude used to look up the location when --location is absent
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lng: Option<f64>,
    },

    /// Collection operations
    Collection {
        #[command(subcommand)]
        action: CollectionCommands,
    },

    /// Suggest rock types to look for at a location
    Suggest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },

    /// Show the field-guide entry for a rock type
    Lookup {
        /// Rock name, e.g. "Red Sandstone"
        name: String,
    },

    /// Show the Mohs hardness scale and luster guide
    Learn {
        /// Highlight the reference mineral for this hardness
        #[arg(long)]
        hardness: Option<f64>,
    },

    /// Ask Dr. Rock a geology question (interactive when no message is given)
    Chat {
        message: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show AI engine and collection status
    Status,
}

#[derive(Subcommand, Debug)]
enum CollectionCommands {
    /// List saved records, newest first
    List,

    /// Show one record in full
    Show {
        id: String,
    },

    /// Remove a record
    Remove {
        id: String,
    },

    /// Search and filter the collection
    Search {
        /// Matches name, description, notes or location
        query: Option<String>,

        /// Rock type to include (repeatable)
        #[arg(long = "type", value_parser = ROCK_TYPES)]
        types: Vec<String>,

        /// Luster to include (repeatable)
        #[arg(long)]
        luster: Vec<String>,

        /// Maximum Mohs hardness (1-10)
        #[arg(long)]
        max_hardness: Option<f64>,
    },

    /// Export the collection to JSON
    Export {
        /// Output file
        output: PathBuf,
    },

    /// Remove every record
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "rockhound.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(&cli.config)?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Identify { images, save, notes, location, lat, lng } => {
            let coords = lat.zip(lng);
            run_identify(&config, images, save, notes, location, coords, json).await
        }
        Commands::Collection { action } => run_collection_command(&config, action, json),
        Commands::Suggest { lat, lng } => run_suggest(&config, lat, lng, json).await,
        Commands::Lookup { name } => run_lookup(&name, json),
        Commands::Learn { hardness } => run_learn(hardness, json),
        Commands::Chat { message } => run_chat(&config, message).await,
        Commands::Config { action } => run_config_command(config, action),
        Commands::Status => run_status(&config).await,
    }
}

fn open_collection(config: &AppConfig) -> Result<Collection<SqliteKv>> {
    let kv = SqliteKv::open(&config.storage.path)?;
    Ok(Collection::open(kv, config.storage.collection_key.as_str()))
}

/// Identify a specimen and optionally save it
async fn run_identify(
    config: &AppConfig,
    images: Vec<PathBuf>,
    save: bool,
    notes: Option<String>,
    location: Option<String>,
    coords: Option<(f64, f64)>,
    json: bool,
) -> Result<()> {
    for path in &images {
        if !path.is_file() {
            return Err(RockhoundError::InvalidInput(format!("{} is not a file", path.display())));
        }
        if !is_supported_image(path) {
            warn!("{} does not look like an image, trying anyway", path.display());
        }
    }

    let identifier = VisionIdentifier::from_config(config)?;
    let result = identifier.identify(&images).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_identification(&result);
    }

    if !save {
        return Ok(());
    }

    let location = match (location, coords) {
        (Some(location), _) => Some(location),
        (None, Some((lat, lng))) => Some(resolve_location(config, lat, lng).await),
        (None, None) => None,
    };

    let image_uri = images[0].canonicalize().unwrap_or_else(|_| images[0].clone());
    let record = Record::from_identification(
        &result,
        image_uri.to_string_lossy(),
        notes.as_deref(),
        location.as_deref(),
    );

    let store = open_collection(config)?;
    let id = record.id.clone();
    store.save(record)?;
    store.close()?;
    info!("Saved to collection as {}", id);
    if !json {
        println!("\nSaved to collection: {}", id);
    }

    Ok(())
}

/// Reverse geocode, falling back to a generic label
async fn resolve_location(config: &AppConfig, lat: f64, lng: f64) -> String {
    let address = match GeocodeClient::new(&config.geology) {
        Ok(client) => client.reverse(lat, lng).await,
        Err(e) => Err(e),
    };
    match address {
        Ok(address) => address.format(),
        Err(e) => {
            warn!("Could not fetch location: {}", e);
            format!("{:.5}, {:.5}", lat, lng)
        }
    }
}

fn print_identification(result: &IdentificationResult) {
    println!("{}", result.display_name());
    if let Some(confidence) = result.confidence() {
        println!("  Confidence: {:.0}%", confidence);
    }
    if let Some(classification) = result.classification() {
        println!("  Classification: {}", classification);
    }
    if let Some(description) = result.description() {
        println!("\n{}", description);
    }
    if let Some(props) = result.physical_properties() {
        print_physical(props);
    }
    for prop in result.properties() {
        println!("  {}: {}", prop.name, prop.value);
    }
}

fn print_physical(props: &rockhound::record::PhysicalProperties) {
    let rows = [
        ("Hardness", &props.hardness),
        ("Luster", &props.luster),
        ("Color", &props.color_range),
        ("Streak", &props.streak_color),
        ("Cleavage/Fracture", &props.cleavage_fracture),
        ("Crystal structure", &props.crystal_structure),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    }
}

fn print_record_line(record: &Record) {
    println!(
        "  {}  {}  [{}]  {}",
        record.id,
        record.name,
        record.classification.as_deref().unwrap_or("-"),
        record.date.get(..10).unwrap_or(&record.date),
    );
}

fn print_record(record: &Record) {
    println!("{} ({})", record.name, record.id);
    println!("  Saved: {}", record.date);
    println!("  Image: {}", record.image_uri);
    if let Some(ref classification) = record.classification {
        println!("  Classification: {}", classification);
    }
    if let Some(ref location) = record.location {
        println!("  Location: {}", location);
    }
    if let Some(ref notes) = record.notes {
        println!("  Notes: {}", notes);
    }
    if let Some(ref description) = record.description {
        println!("\n{}\n", description);
    }
    if let Some(ref props) = record.physical_properties {
        print_physical(props);
    }
    for prop in &record.properties {
        println!("  {}: {}", prop.name, prop.value);
    }
}

fn print_records(records: &[Record], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No rocks found");
        return Ok(());
    }
    for record in records {
        print_record_line(record);
    }
    println!("\n{} record(s)", records.len());
    Ok(())
}

/// Run collection commands
fn run_collection_command(config: &AppConfig, action: CollectionCommands, json: bool) -> Result<()> {
    let store = open_collection(config)?;

    match action {
        CollectionCommands::List => {
            print_records(&store.list(), json)?;
        }
        CollectionCommands::Show { id } => match store.get_by_id(&id) {
            Some(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
            Some(record) => print_record(&record),
            None => println!("No record with id {}", id),
        },
        CollectionCommands::Remove { id } => {
            let existed = store.get_by_id(&id).is_some();
            store.remove_by_id(&id)?;
            if existed {
                println!("Removed {}", id);
            } else {
                println!("No record with id {}", id);
            }
        }
        CollectionCommands::Search { query, types, luster, max_hardness } => {
            let mut state = FilterState::new().with_search(query.unwrap_or_default());
            for t in types {
                state = state.with_classification(t);
            }
            for l in luster {
                if !LUSTERS.iter().any(|(name, _)| name.eq_ignore_ascii_case(&l)) {
                    warn!("'{}' is not a known luster", l);
                }
                state = state.with_luster(l);
            }
            if let Some(threshold) = max_hardness {
                state = state.with_max_hardness(threshold);
            }

            info!("Applying {} filter(s)", state.active_count());
            print_records(&filter::apply(&store.list(), &state), json)?;
        }
        CollectionCommands::Export { output } => {
            let count = store.export(&output)?;
            println!("Exported {} records to {:?}", count, output);
        }
        CollectionCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing the collection");
                return Ok(());
            }
            store.clear()?;
            println!("Collection cleared");
        }
    }

    store.close()
}

fn print_details(details: &RockDetails) {
    println!("{}", details.name);
    println!("  {}", details.description);
    println!("  Color: {}", details.color);
    println!("  Grain size: {}", details.grain_size);
    println!("  Hardness: {}", details.hardness);
    println!("  Luster: {}", details.luster);
    println!("  Streak: {}", details.streak);
    println!("  Key features: {}", details.features);
    if let Some(confusion) = details.confusion {
        println!("  Often confused with: {}", confusion);
    }
}

/// Regional rock guide for a point
async fn run_suggest(config: &AppConfig, lat: f64, lng: f64, json: bool) -> Result<()> {
    let client = MacrostratClient::new(&config.geology)?;
    let report: SuggestionReport = client.report_at(lat, lng).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(ref region) = report.region {
        println!("Region: {}", region);
    }
    if let Some(message) = report.message() {
        println!("{}", message);
    }
    for suggestion in &report.suggestions {
        println!();
        if suggestion.name != suggestion.details.name {
            println!("({})", suggestion.name);
        }
        print_details(suggestion.details);
    }

    Ok(())
}

fn run_lookup(name: &str, json: bool) -> Result<()> {
    match geology::lookup(name) {
        Some(details) if json => println!("{}", serde_json::to_string_pretty(details)?),
        Some(details) => print_details(details),
        None if geology::is_generic(name) => println!("'{}' is too broad for a field-guide entry", name),
        None => println!("No field-guide entry for '{}'", name),
    }
    Ok(())
}

fn run_learn(hardness: Option<f64>, json: bool) -> Result<()> {
    let marked = hardness.and_then(filter::mohs_reference).map(|(h, _, _)| *h);

    if json {
        let scale: Vec<_> = MOHS_SCALE
            .iter()
            .map(|(h, mineral, test)| serde_json::json!({ "hardness": h, "mineral": mineral, "test": test }))
            .collect();
        let lusters: Vec<_> = LUSTERS
            .iter()
            .map(|(name, hint)| serde_json::json!({ "name": name, "hint": hint }))
            .collect();
        let out = serde_json::json!({ "mohs": scale, "lusters": lusters, "reference": marked });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Mohs Hardness Scale");
    println!("===================");
    for (h, mineral, test) in MOHS_SCALE.iter() {
        let mark = if marked == Some(*h) { ">" } else { " " };
        println!("{} {:>2}  {:<11} {}", mark, h, mineral, test);
    }

    println!("\nLuster");
    println!("======");
    for (name, hint) in LUSTERS.iter() {
        println!("  {:<11} {}", name, hint);
    }

    Ok(())
}

/// Chat with Dr. Rock
async fn run_chat(config: &AppConfig, message: Option<String>) -> Result<()> {
    let backend = OllamaChat::from_config(config)?;
    let mut conversation = Conversation::new(config.prompts.chat_persona.as_str());

    if let Some(message) = message {
        if let Some(reply) = conversation.ask(&backend, &message).await {
            println!("{}", reply.text);
        }
        return Ok(());
    }

    if let Some(welcome) = conversation.turns().first() {
        println!("Dr. Rock: {}\n", welcome.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        if let Some(reply) = conversation.ask(&backend, line).await {
            println!("Dr. Rock: {}\n", reply.text);
        }
    }

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
    }

    Ok(())
}

/// Run status check
async fn run_status(config: &AppConfig) -> Result<()> {
    let client = OllamaClient::new(&config.ai_engine)?;

    println!("Rockhound v{} Status", env!("CARGO_PKG_VERSION"));
    println!("======================");

    match client.health_check().await {
        Ok(()) => println!("Ollama ({}): Running", client.base_url()),
        Err(e) => println!("Ollama: Error - {}", e),
    }

    for (role, model) in [("Vision", &config.ai_engine.models.vision), ("Chat", &config.ai_engine.models.chat)] {
        match client.model_available(model).await {
            Ok(true) => println!("  {} model '{}': available", role, model),
            Ok(false) => println!("  {} model '{}': not pulled", role, model),
            Err(_) => println!("  {} model '{}': unknown", role, model),
        }
    }

    match open_collection(config) {
        Ok(store) => {
            println!("\nCollection ({}):", Path::new(&config.storage.path).display());
            println!("  Key: {}", store.key());
            println!("  Records: {}", store.len());
        }
        Err(e) => println!("\nCollection: Error - {}", e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["rockhound"]).is_err());
    }

    #[test]
    fn test_cli_identify_command() {
        let cli = Cli::try_parse_from([
            "rockhound", "identify", "a.jpg", "b.jpg", "--save", "--notes", "creek bed",
        ]).unwrap();

        match cli.command {
            Commands::Identify { images, save, notes, location, lat, .. } => {
                assert_eq!(images, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
                assert!(save);
                assert_eq!(notes.as_deref(), Some("creek bed"));
                assert!(location.is_none());
                assert!(lat.is_none());
            }
            _ => panic!("Expected Identify command"),
        }
    }

    #[test]
    fn test_cli_identify_needs_images() {
        assert!(Cli::try_parse_from(["rockhound", "identify"]).is_err());
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::try_parse_from([
            "rockhound", "--format", "json", "collection", "search", "quartz",
            "--type", "Igneous", "--type", "Mineral", "--luster", "Vitreous", "--max-hardness", "7",
        ]).unwrap();
        assert_eq!(cli.format, "json");

        match cli.command {
            Commands::Collection { action: CollectionCommands::Search { query, types, luster, max_hardness } } => {
                assert_eq!(query.as_deref(), Some("quartz"));
                assert_eq!(types, vec!["Igneous", "Mineral"]);
                assert_eq!(luster, vec!["Vitreous"]);
                assert_eq!(max_hardness, Some(7.0));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_rock_type() {
        assert!(Cli::try_parse_from(["rockhound", "collection", "search", "--type", "Lava"]).is_err());
    }

    #[test]
    fn test_cli_suggest_negative_coordinates() {
        let cli = Cli::try_parse_from(["rockhound", "suggest", "--lat", "40.71", "--lng", "-74.0"]).unwrap();
        match cli.command {
            Commands::Suggest { lat, lng } => {
                assert_eq!(lat, 40.71);
                assert_eq!(lng, -74.0);
            }
            _ => panic!("Expected Suggest command"),
        }
    }

    #[test]
    fn test_cli_learn_command() {
        let cli = Cli::try_parse_from(["rockhound", "learn", "--hardness", "6.5"]).unwrap();
        assert!(matches!(cli.command, Commands::Learn { hardness: Some(h) } if h == 6.5));

        let cli = Cli::try_parse_from(["rockhound", "learn"]).unwrap();
        assert!(matches!(cli.command, Commands::Learn { hardness: None }));
    }

    #[test]
    fn test_cli_lookup_command() {
        let cli = Cli::try_parse_from(["rockhound", "-v", "lookup", "Red Sandstone"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Lookup { ref name } if name == "Red Sandstone"));
    }
}
