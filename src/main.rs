use std::io::stdout;
use std::process::ExitCode;

use clap::error::ErrorKind;
use color_eyre::Result;
use sysdash::app::{Dashboard, Outcome};
use sysdash::cli::{ArgsError, Invocation};
use sysdash::event::Interrupts;
use sysdash::logging;
use sysdash::pipeline::{Pipeline, Sources};
use sysdash::prompt::TerminalPrompt;
use sysdash::system::cpu::CpuSource;
use sysdash::system::memory::MemorySource;
use sysdash::system::sessions::SessionSource;
use sysdash::ui::{Mode, Screen};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let invocation = match Invocation::parse_from(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(ArgsError::Clap(err))
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
        {
            err.print()?;
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => {
            eprintln!("args: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let config = invocation.load_config();
    let run_config = match invocation.resolve(&config.general) {
        Ok(run_config) => run_config,
        Err(err) => {
            eprintln!("args: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    logging::init(&config.logging, invocation.cli.log_file.as_deref())?;
    tracing::info!(?run_config, "starting dashboard");

    let sources = Sources {
        memory: MemorySource::new(),
        sessions: SessionSource::new(&config.sources.utmp),
        cpu: CpuSource::new(&config.sources.proc_stat, &config.sources.cpuinfo),
    };
    let pipeline = Pipeline::spawn(&run_config, sources);
    let screen = Screen::new(stdout(), Mode::for_config(&run_config));
    let mut dashboard = Dashboard::new(
        run_config,
        pipeline,
        Interrupts::listen(),
        TerminalPrompt,
        screen,
    );

    match dashboard.run().await {
        Ok(
            Outcome::Completed { iterations }
            | Outcome::Quit { iterations }
            | Outcome::Terminated { iterations },
        ) => {
            tracing::info!(iterations, "exiting");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
