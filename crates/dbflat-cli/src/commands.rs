//! Command execution

use std::sync::Arc;

use anyhow::Context;
use dbflat_core::{CancellationToken, ConnectionConfig, DbflatError};
use dbflat_driver_sqlite::{SqliteConnection, SqliteDriver};
use dbflat_interchange::{
    ErrorCategory, ExportError, ExportEvent, ExportOptions, ExportTarget, ExportVariant, Exporter,
    ImportError, ImportEvent, ImportOptions, Importer, Verbosity,
};
use signal_hook::consts::TERM_SIGNALS;

use crate::args::{Cli, Command, ExportArgs, ImportArgs};
use crate::settings::Settings;

pub fn run(cli: &Cli, settings: &Settings, verbosity: Verbosity) -> anyhow::Result<()> {
    let config = settings.connection_config(cli.database.as_deref())?;

    match &cli.command {
        Command::Export(args) => export(&config, args, settings, verbosity),
        Command::Import(args) => import(&config, args, settings, verbosity),
        Command::Check => check(&config),
    }
}

/// Exit status for a failed command
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let category = if let Some(e) = err.downcast_ref::<ExportError>() {
        e.category()
    } else if let Some(e) = err.downcast_ref::<ImportError>() {
        e.category()
    } else if let Some(e) = err.downcast_ref::<DbflatError>() {
        database_category(e)
    } else {
        ErrorCategory::Configuration
    };
    category.exit_code()
}

fn database_category(err: &DbflatError) -> ErrorCategory {
    match err {
        DbflatError::Configuration(_) => ErrorCategory::Configuration,
        DbflatError::Connection(_) | DbflatError::Io(_) => ErrorCategory::Io,
        DbflatError::Schema(_) => ErrorCategory::Schema,
        DbflatError::Cancelled => ErrorCategory::Cancelled,
        DbflatError::Query(_) => ErrorCategory::Execution,
    }
}

/// Token that SIGINT/SIGTERM cancel; a second signal exits at once
fn cancellation_on_signal() -> anyhow::Result<CancellationToken> {
    let token = CancellationToken::new();
    for &signal in TERM_SIGNALS {
        signal_hook::flag::register_conditional_shutdown(signal, 130, token.flag())
            .with_context(|| format!("failed to install handler for signal {}", signal))?;
        signal_hook::flag::register(signal, token.flag())
            .with_context(|| format!("failed to install handler for signal {}", signal))?;
    }
    Ok(token)
}

fn connect(config: &ConnectionConfig) -> anyhow::Result<Arc<SqliteConnection>> {
    let conn = SqliteDriver::new().connect(config)?;
    Ok(Arc::new(conn))
}

fn export(
    config: &ConnectionConfig,
    args: &ExportArgs,
    settings: &Settings,
    verbosity: Verbosity,
) -> anyhow::Result<()> {
    // Unknown variants fail before the database or the output file is touched
    let variant: ExportVariant = args.variant.parse()?;
    let conn = connect(config)?;

    let options = ExportOptions {
        row_limit: args.top,
        delimiters: args.format.delimiters(&settings.format),
        verbosity,
        ..Default::default()
    };
    let target = ExportTarget::from_path(args.outfile.clone());

    let exporter = Exporter::new(conn, options)
        .with_cancellation(cancellation_on_signal()?)
        .with_progress_callback(Box::new(|event: ExportEvent| println!("{}", event)));

    let summary = exporter.export_variant(variant, &target)?;
    tracing::debug!(
        variant = %summary.variant,
        rows = summary.rows_written,
        columns = summary.column_count,
        "export finished"
    );
    Ok(())
}

fn import(
    config: &ConnectionConfig,
    args: &ImportArgs,
    settings: &Settings,
    verbosity: Verbosity,
) -> anyhow::Result<()> {
    let conn = connect(config)?;

    let options = ImportOptions {
        delimiters: args.format.delimiters(&settings.format),
        drop_existing: args.drop_existing,
        ..Default::default()
    };

    let importer = Importer::new(conn.clone(), conn, options)
        .with_cancellation(cancellation_on_signal()?)
        .with_progress_callback(Box::new(move |event: ImportEvent| {
            if verbosity >= import_event_level(&event) {
                println!("{}", event);
            }
        }));

    let summary = importer.import_file(&args.infile, &args.table)?;
    tracing::debug!(
        table = %summary.table,
        rows = summary.rows_imported,
        batches = summary.batches_executed,
        "import finished"
    );
    Ok(())
}

/// Lowest verbosity at which an import event is printed
fn import_event_level(event: &ImportEvent) -> Verbosity {
    match event {
        ImportEvent::Committed { .. } => Verbosity::Quiet,
        ImportEvent::TableCleared { .. } => Verbosity::Normal,
        ImportEvent::BatchExecuted { .. } => Verbosity::Detailed,
    }
}

fn check(config: &ConnectionConfig) -> anyhow::Result<()> {
    SqliteDriver::new().test_connection(config)?;
    println!(
        "Connected to {}",
        config.get_string("path").unwrap_or_default()
    );
    Ok(())
}
