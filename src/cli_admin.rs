use anyhow::Result;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use clap::{CommandFactory, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};

use capture_catalog_server::capture_store::{CaptureStore, SqliteCaptureStore};
use capture_catalog_server::user::{SqliteUserStore, UserManager, UserRole};

use rustyline::{
    completion::Completer,
    highlight::Highlighter,
    history::FileHistory,
    validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn get_styles() -> Styles {
    let heading = Style::new()
        .bold()
        .underline()
        .fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
    let invalid = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Red)));
    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .invalid(invalid)
        .error(invalid)
}

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Directory holding captures.db and user.db.
    #[clap(value_parser = parse_path)]
    pub db_dir: PathBuf,
}

#[derive(Parser)]
#[command(styles=get_styles(),name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates a user with the given handle.
    AddUser { user_handle: String },

    /// Creates a password login for the given user.
    /// Fails if the user already has a password set.
    AddLogin {
        user_handle: String,
        password: String,
    },

    /// Changes the password of a user, fails if no password was set.
    UpdateLogin {
        user_handle: String,
        password: String,
    },

    /// Deletes the password login of a given user.
    DeleteLogin { user_handle: String },

    /// Shows credentials, tokens, roles and permissions of a given user.
    Show { user_handle: String },

    /// Compares a password against the stored hash without creating a token.
    CheckPassword {
        user_handle: String,
        password: String,
    },

    /// Shows all user handles.
    UserHandles,

    /// Shows all available roles and their permissions.
    ListRoles,

    /// Adds a role to a user. Admin makes the user a store owner.
    AddRole { user_handle: String, role: String },

    /// Removes a role from a user.
    RemoveRole { user_handle: String, role: String },

    /// Adds an artist that captures can be attributed to.
    AddArtist {
        name: String,
        /// Name shown instead of the unique one.
        #[clap(long)]
        friendly_name: Option<String>,
    },

    /// Shows all artists.
    ListArtists,

    /// Shows the paths of the current databases.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

struct AdminContext {
    user_manager: UserManager,
    capture_store: SqliteCaptureStore,
    db_dir: PathBuf,
}

fn parse_role(role: &str) -> Result<UserRole, String> {
    UserRole::from_str(role).ok_or_else(|| {
        format!(
            "Invalid role '{}'. Valid roles are: Admin, Regular",
            role
        )
    })
}

fn find_user_id(user_manager: &UserManager, user_handle: &str) -> Result<usize, String> {
    match user_manager.get_user_id(user_handle) {
        Ok(Some(user_id)) => Ok(user_id),
        Ok(None) => Err(format!("User '{}' not found", user_handle)),
        Err(err) => Err(format!("{}", err)),
    }
}

fn show_user(user_manager: &UserManager, user_handle: &str) -> Result<(), String> {
    let user_id = find_user_id(user_manager, user_handle)?;

    println!("User Credentials:");
    match user_manager.get_user_credentials(user_handle) {
        Ok(credentials) => println!("{:#?}", credentials),
        Err(err) => println!("Failed to get credentials: {}", err),
    }

    println!("\nAuth Tokens:");
    match user_manager.get_user_tokens(user_handle) {
        Ok(tokens) => {
            for token in tokens.iter() {
                println!("{:#?}", token);
            }
        }
        Err(err) => println!("Failed to get tokens: {}", err),
    }

    match user_manager.get_user_roles(user_id) {
        Ok(roles) => {
            println!("\nRoles:");
            if roles.is_empty() {
                println!("  (no roles assigned)");
            }
            for role in roles.iter() {
                println!("  - {}", role);
            }
        }
        Err(err) => println!("\nFailed to get roles: {}", err),
    }

    match user_manager.get_user_permissions(user_id) {
        Ok(permissions) => {
            println!("\nResolved Permissions:");
            if permissions.is_empty() {
                println!("  (no permissions)");
            }
            for permission in permissions.iter() {
                println!("  - {:?}", permission);
            }
        }
        Err(err) => println!("\nFailed to get permissions: {}", err),
    }
    Ok(())
}

fn run_command(command: InnerCommand, ctx: &AdminContext) -> Result<bool, String> {
    let user_manager = &ctx.user_manager;
    match command {
        InnerCommand::AddUser { user_handle } => {
            let user_id = user_manager
                .add_user(&user_handle)
                .map_err(|err| format!("{}", err))?;
            println!("Created user '{}' with id {}", user_handle, user_id);
        }
        InnerCommand::AddLogin {
            user_handle,
            password,
        } => user_manager
            .create_password_credentials(&user_handle, &password)
            .map_err(|err| format!("{}", err))?,
        InnerCommand::UpdateLogin {
            user_handle,
            password,
        } => user_manager
            .update_password_credentials(&user_handle, &password)
            .map_err(|err| format!("{}", err))?,
        InnerCommand::DeleteLogin { user_handle } => user_manager
            .delete_password_credentials(&user_handle)
            .map_err(|err| format!("{}", err))?,
        InnerCommand::Show { user_handle } => show_user(user_manager, &user_handle)?,
        InnerCommand::CheckPassword {
            user_handle,
            password,
        } => {
            let msg = match user_manager.verify_password(&user_handle, &password) {
                Ok(Some(_)) => "The password provided is correct!".to_string(),
                Ok(None) => "Wrong password, or the user has no password set.".to_string(),
                Err(err) => format!(
                    "Could not verify the password, something went wrong: {}",
                    err
                ),
            };
            println!("{}", msg);
        }
        InnerCommand::UserHandles => match user_manager.get_all_user_handles() {
            Ok(handles) => println!("{:#?}", handles),
            Err(err) => return Err(format!("{}", err)),
        },
        InnerCommand::ListRoles => {
            println!("Available Roles:\n");
            for role in UserRole::ALL {
                println!("Role: {}", role);
                println!("Permissions:");
                for permission in role.permissions() {
                    println!("  - {:?}", permission);
                }
                println!();
            }
        }
        InnerCommand::AddRole { user_handle, role } => {
            let role = parse_role(&role)?;
            let user_id = find_user_id(user_manager, &user_handle)?;
            user_manager
                .add_user_role(user_id, role)
                .map_err(|err| format!("{}", err))?;
            println!("Role '{}' added to user '{}'", role, user_handle);
        }
        InnerCommand::RemoveRole { user_handle, role } => {
            let role = parse_role(&role)?;
            let user_id = find_user_id(user_manager, &user_handle)?;
            user_manager
                .remove_user_role(user_id, role)
                .map_err(|err| format!("{}", err))?;
            println!("Role '{}' removed from user '{}'", role, user_handle);
        }
        InnerCommand::AddArtist {
            name,
            friendly_name,
        } => {
            let artist = ctx
                .capture_store
                .create_artist(&name, friendly_name.as_deref())
                .map_err(|err| format!("{}", err))?;
            println!("Created artist {:?}", artist);
        }
        InnerCommand::ListArtists => match ctx.capture_store.list_artists() {
            Ok(artists) => {
                for artist in artists.iter() {
                    println!("{:>5}  {}", artist.id, artist.display_name());
                }
            }
            Err(err) => return Err(format!("{}", err)),
        },
        InnerCommand::Where => {
            println!("{}", ctx.db_dir.join("captures.db").display());
            println!("{}", ctx.db_dir.join("user.db").display());
        }
        InnerCommand::Exit => return Ok(false),
    }
    Ok(true)
}

fn execute_command(line: String, ctx: &AdminContext) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            println!("{} {}", PROMPT, &line);
            match run_command(cli.command, ctx) {
                Ok(true) => CommandExecutionResult::Ok,
                Ok(false) => CommandExecutionResult::Exit,
                Err(err) => CommandExecutionResult::Error(err),
            }
        }
        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
            CommandExecutionResult::Ok
        }
    }
}

#[derive(rustyline_derive::Hinter)]
struct AdminHelper {
    commands_names: Vec<String>,
}

impl AdminHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        AdminHelper { commands_names }
    }
}

impl Completer for AdminHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for AdminHelper {}
impl Validator for AdminHelper {}
impl Helper for AdminHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    if !cli_args.db_dir.is_dir() {
        anyhow::bail!("Database directory does not exist: {:?}", cli_args.db_dir);
    }

    let user_store = SqliteUserStore::new(cli_args.db_dir.join("user.db"))?;
    let ctx = AdminContext {
        user_manager: UserManager::new(Arc::new(user_store)),
        capture_store: SqliteCaptureStore::new(cli_args.db_dir.join("captures.db"))?,
        db_dir: cli_args.db_dir,
    };

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<AdminHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(AdminHelper::new()));
    let _ = rl.clear_screen();

    loop {
        let readline = rl.readline(PROMPT);

        let _ = rl.clear_screen();
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &ctx) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {}", err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
