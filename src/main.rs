// SPDX-License-Identifier: BSD-3-Clause
use std::io::{self, Write};

use anyhow::{anyhow, Context, Error, Result};
use clap::Parser;

use tracing_subscriber::{fmt, prelude::*};

use ptrules::{llvm, program_rules, CallMaps, Models};

mod cli;

fn setup_global_subscriber() {
    let filter_layer = tracing::level_filters::LevelFilter::TRACE;
    let fmt_layer = fmt::Layer::default().with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<()> {
    let args = cli::Args::parse();

    if args.tracing {
        setup_global_subscriber();
    }

    let models = if let Some(models_path) = args.models {
        let models_string =
            std::fs::read_to_string(models_path).context("Couldn't read memory models")?;
        let user = Models::new(
            serde_json::from_str(&models_string).context("Couldn't deserialize memory models")?,
        )
        .context("Couldn't construct memory models")?;
        Models::libc()
            .extend(user)
            .context("Couldn't construct memory models")?
    } else {
        Models::libc()
    };

    let llvm_module = llvm_ir::Module::from_bc_path(&args.module)
        .map_err(Error::msg)
        .with_context(|| {
            format!(
                "Couldn't parse LLVM bitcode module at {}",
                args.module.display()
            )
        })?;
    let module = llvm::Module::new(&llvm_module).context("Malformed LLVM module")?;
    drop(llvm_module);

    let index = CallMaps::build(&module, &models);
    let out = program_rules(&module, &models, &index);

    if !args.quiet {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "rules")?;
        writeln!(stdout, "-----")?;
        for rule in &out.rules {
            writeln!(stdout, "{}", rule)?;
        }
        if args.check != cli::Check::None {
            writeln!(stdout)?;
            writeln!(stdout, "failures")?;
            writeln!(stdout, "--------")?;
            for (value, e) in &out.failures {
                writeln!(stdout, "{}: {}", value, e)?;
            }
        }
    }

    if let cli::Check::Strict = args.check {
        if !out.failures.is_empty() {
            return Err(anyhow!(
                "Couldn't translate {} value(s) to pointer rules",
                out.failures.len()
            ));
        }
    }

    Ok(())
}
