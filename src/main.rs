use log::LevelFilter;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use mysh::config::{ConfigLoader, ShellConfig};
use mysh::environment::Environment;
use mysh::prompt::ShellPrompt;
use mysh::repl::Shell;

extern "C" fn on_sigint(_: libc::c_int) {
    // Only async-signal-safe calls in here.
    unsafe {
        libc::write(libc::STDOUT_FILENO, b"\n".as_ptr().cast(), 1);
    }
}

/// Keep Ctrl-C from killing the interpreter. A caught signal is reset to its
/// default disposition on exec, so children still receive it normally.
///
/// No `SA_RESTART`: a pending read at the prompt must fail with EINTR so the
/// loop can show the prompt again.
fn install_sigint_handler() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_sigint),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGINT, &action) }.map(|_| ())
}

fn init_logging(level: LevelFilter) {
    if level == LevelFilter::Off {
        return;
    }
    if let Err(e) = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("mysh: failed to initialize logging: {}", e);
    }
}

fn main() {
    let mut env = Environment::new();
    env.setup_defaults();

    let config = ShellConfig::from_env(&env);
    init_logging(config.log_level);
    log::debug!("{:?}", config);

    if let Some(rc_path) = config.rc_path() {
        match ConfigLoader::load_from_file(&rc_path, &mut env) {
            Ok(warnings) => {
                for warning in warnings {
                    eprintln!("mysh: .myshrc: {}", warning);
                }
            }
            Err(e) => eprintln!("mysh: {}", e),
        }
    }

    if let Err(e) = install_sigint_handler() {
        log::warn!("could not install SIGINT handler: {}", e);
    }

    let prompt = ShellPrompt::new();
    let mut shell = Shell::new(env);
    let code = shell.run_interactive(&prompt);
    std::process::exit(code);
}
