use clap::{Arg, ArgAction, ArgMatches, Command};
use hr_ingest::loader::{import_file, load_initial, LoadSource};
use hr_ingest::storage::FileStore;
use hr_ingest::template::{write_template, TEMPLATE_FILE_NAME};
use hr_ingest::{EmployeeStore, Field, Filter, IngestConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("hrdb")
        .about("Employee records: import, inspect and export")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .env("HRDB_DATA_DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("db")
                .global(true),
        )
        .arg(
            Arg::new("store-dir")
                .long("store-dir")
                .env("HRDB_STORE_DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(".hrdb")
                .global(true),
        )
        .arg(
            Arg::new("charset")
                .long("charset")
                .help("Charset of text data files (WHATWG label)")
                .default_value("utf-8")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(Command::new("load").about("Load DB.* from the data dir, else the saved snapshot"))
        .subcommand(
            Command::new("import")
                .about("Replace all employees with the contents of a file")
                .arg(Arg::new("file").required(true).value_parser(clap::value_parser!(PathBuf))),
        )
        .subcommand(
            Command::new("list")
                .about("List employees matching the filters")
                .arg(Arg::new("search").long("search").default_value(""))
                .arg(Arg::new("nationality").long("nationality"))
                .arg(Arg::new("status").long("status"))
                .arg(Arg::new("job").long("job"))
                .arg(Arg::new("schedule").long("schedule")),
        )
        .subcommand(
            Command::new("show")
                .about("Show every known field of one employee")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(Command::new("stats").about("Show employee counters"))
        .subcommand(
            Command::new("delete")
                .about("Delete an employee by number")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("template")
                .about("Write the sample import workbook")
                .arg(
                    Arg::new("out")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value(TEMPLATE_FILE_NAME),
                ),
        )
        .subcommand(
            Command::new("clear")
                .about("Delete every employee and the saved snapshot")
                .arg(Arg::new("yes").long("yes").action(ArgAction::SetTrue)),
        )
}

fn config_from(matches: &ArgMatches) -> anyhow::Result<IngestConfig> {
    let charset = matches.get_one::<String>("charset").map(String::as_str).unwrap_or("utf-8");
    let mut config = IngestConfig::default()
        .with_charset_label(charset)
        .ok_or_else(|| anyhow::anyhow!("unknown charset: {charset}"))?;
    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config = config.with_data_dir(dir);
    }
    if let Some(dir) = matches.get_one::<PathBuf>("store-dir") {
        config = config.with_store_dir(dir);
    }
    Ok(config)
}

fn print_row(rec: &hr_ingest::Record) {
    println!(
        "{}\t{}\t{}\t{}\t{}",
        rec.field_or_empty(Field::EmployeeNumber),
        rec.field_or_empty(Field::EnglishName),
        rec.field_or_empty(Field::Nationality),
        rec.field_or_empty(Field::ContractStatus),
        rec.field(Field::ContractDate).unwrap_or(hr_ingest::ABSENT_DATE),
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config = config_from(&matches)?;
    let kv = FileStore::new(&config.store_dir);
    let key = config.storage_key.as_str();

    match matches.subcommand() {
        Some(("load", _)) => {
            let (store, source) = load_initial(&config, &kv).await?;
            match source {
                LoadSource::DataFile(p) => println!("loaded {} employees from {}", store.len(), p.display()),
                LoadSource::Snapshot => println!("restored {} employees from snapshot", store.len()),
            }
        }
        Some(("import", sub)) => {
            let path = sub
                .get_one::<PathBuf>("file")
                .ok_or_else(|| anyhow::anyhow!("missing file"))?;
            let decoded = import_file(path, &config).await?;
            if let Some(msg) = decoded.error_message() {
                anyhow::bail!(msg);
            }
            if decoded.records.is_empty() {
                anyhow::bail!("data file is invalid or empty: {}", path.display());
            }
            let mut store = EmployeeStore::new();
            store.replace_all(decoded.records);
            store.save_to(&kv, key).await?;
            println!("imported {} employees", store.len());
        }
        Some(("list", sub)) => {
            let mut store = EmployeeStore::new();
            store.load_from(&kv, key).await?;
            let opt = |name: &str| sub.get_one::<String>(name).cloned();
            let filter = Filter {
                search: opt("search").unwrap_or_default(),
                nationality: opt("nationality"),
                contract_status: opt("status"),
                job_title: opt("job"),
                work_schedule: opt("schedule"),
            };
            store.apply_filter(&filter);
            for rec in store.filtered() {
                print_row(rec);
            }
        }
        Some(("show", sub)) => {
            let id = sub
                .get_one::<String>("id")
                .ok_or_else(|| anyhow::anyhow!("missing id"))?;
            let mut store = EmployeeStore::new();
            store.load_from(&kv, key).await?;
            let rec = store
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("no employee with number {id}"))?;
            for (field, value) in rec.known_fields() {
                let mark = if field.is_required() { "*" } else { "" };
                println!("{field}{mark}\t{value}");
            }
        }
        Some(("stats", _)) => {
            let mut store = EmployeeStore::new();
            store.load_from(&kv, key).await?;
            let s = store.statistics();
            println!(
                "total={} active={} inactive={} avg_salary={}",
                s.total, s.active, s.inactive, s.average_salary
            );
            println!("nationalities={:?}", store.distinct_values(Field::Nationality));
            println!("jobs={:?}", store.distinct_values(Field::JobTitle));
            println!("schedules={:?}", store.distinct_values(Field::WorkSchedule));
        }
        Some(("delete", sub)) => {
            let id = sub
                .get_one::<String>("id")
                .ok_or_else(|| anyhow::anyhow!("missing id"))?;
            let mut store = EmployeeStore::new();
            store.load_from(&kv, key).await?;
            let removed = store.remove(id);
            store.save_to(&kv, key).await?;
            println!("removed {removed} employee(s)");
        }
        Some(("template", sub)) => {
            let out = sub
                .get_one::<PathBuf>("out")
                .ok_or_else(|| anyhow::anyhow!("missing output path"))?;
            write_template(out).await?;
            println!("wrote {}", out.display());
        }
        Some(("clear", sub)) => {
            if !sub.get_flag("yes") {
                anyhow::bail!("refusing to delete all employee data without --yes");
            }
            let mut store = EmployeeStore::new();
            store.clear_from(&kv, key).await?;
            println!("cleared all employee data");
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}
