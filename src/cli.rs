use crate::assistant::controller::orders::{Reconciler, Refresh};
use crate::assistant::gateway::transport::{HttpTransport, Transport};
use crate::assistant::gateway::Gateway;
use crate::assistant::model::bill::Bill;
use crate::assistant::model::config::ClientConfig;
use crate::assistant::model::preference::{self, Selection};
use crate::assistant::model::table::{TableCounts, TableFilter};
use crate::assistant::scheduler::poll::PollScheduler;
use crate::assistant::state::{View, ViewState};
use crate::assistant::storage::file::FileStore;
use crate::assistant::storage::SessionStore;
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Parser, Debug)]
#[command(name = "waiter-assistant")]
#[command(about = "waiter assistant used by restaurant staff to follow tables and push orders", version, long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// log in and remember the session
    #[command(arg_required_else_help = true)]
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "WAITER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// forget the stored session
    Logout,
    Whoami,
    /// list tables with their status
    Tables {
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },
    /// show the order of a table, grouped by status
    #[command(arg_required_else_help = true)]
    Orders { table: String },
    Menu {
        #[arg(long, help = "Category id to list.")]
        category: Option<String>,
        #[arg(long, help = "Case-insensitive part of the dish name.", default_value = "")]
        search: String,
    },
    /// preferences offered for a menu item
    #[command(arg_required_else_help = true)]
    Prefs {
        food_id: String,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// open a new order on a free table
    #[command(arg_required_else_help = true)]
    Open {
        table: String,
        #[command(flatten)]
        code: CodeArgs,
        #[arg(long, env = "WAITER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value_t = 1)]
        guests: u32,
    },
    #[command(arg_required_else_help = true)]
    Add {
        table: String,
        food_id: String,
        #[arg(long, default_value_t = 1)]
        qty: u32,
        #[arg(long = "pref", value_name = "PREFERENCE")]
        prefs: Vec<String>,
        #[command(flatten)]
        code: CodeArgs,
    },
    /// send the cart of a table to the kitchen
    #[command(arg_required_else_help = true)]
    Place {
        table: String,
        #[command(flatten)]
        code: CodeArgs,
        #[arg(long, default_value = "")]
        note: String,
    },
    #[command(arg_required_else_help = true)]
    Confirm {
        table: String,
        item: String,
        #[command(flatten)]
        code: CodeArgs,
        #[arg(long, default_value = "")]
        note: String,
    },
    #[command(arg_required_else_help = true)]
    ConfirmAll {
        table: String,
        #[command(flatten)]
        code: CodeArgs,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// change quantity or toggle preferences of a placed item
    #[command(arg_required_else_help = true)]
    Edit {
        table: String,
        item: String,
        #[arg(long)]
        qty: Option<u32>,
        #[arg(long = "pref", value_name = "PREFERENCE", help = "Preference to toggle, repeatable.")]
        prefs: Vec<String>,
    },
    #[command(arg_required_else_help = true)]
    Delete {
        table: String,
        item: String,
        #[command(flatten)]
        code: CodeArgs,
    },
    /// keep polling the table list, or one table, until Ctrl-C
    Watch { table: Option<String> },
}

#[derive(Debug, Args)]
struct CodeArgs {
    #[arg(long = "code", help = "Waiter code authorizing the action.", env = "WAITER_CODE", hide_env_values = true)]
    waiter_code: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Occupied,
    Inactive,
}

impl From<FilterArg> for TableFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => TableFilter::All,
            FilterArg::Occupied => TableFilter::Occupied,
            FilterArg::Inactive => TableFilter::Inactive,
        }
    }
}

pub(crate) async fn run(cli: Cli, config: ClientConfig) -> anyhow::Result<()> {
    let mut sessions = SessionStore::restore(FileStore::new(config.session_dir.clone()));
    let gateway = Gateway::new(HttpTransport::new(&config)?);

    let command = match cli.command {
        Commands::Login { username, password } => {
            let credentials = sessions.login(&gateway, &username, &password).await?;
            println!(
                "logged in as {} ({}) at restaurant={}",
                credentials.user.name, credentials.user.role, credentials.rs_id
            );
            return Ok(());
        }
        Commands::Logout => {
            sessions.logout()?;
            println!("logged out");
            return Ok(());
        }
        Commands::Whoami => {
            match sessions.credentials() {
                Some(c) => println!(
                    "{} ({}) at {}, restaurant={}",
                    c.user.name, c.user.role, c.user.restaurant_name, c.rs_id
                ),
                None => println!("not logged in"),
            }
            if let Some(table) = sessions.session().current_table.as_deref() {
                println!("last viewed table: {}", table);
            }
            return Ok(());
        }
        command => command,
    };

    let credentials = sessions
        .credentials()
        .context("not logged in, run `login` first")?;
    let reconciler = Reconciler::with_state(gateway, credentials.rs_id, sessions.cached_view())
        .with_policy(config.waiter_code, config.add_item_mode);

    let result = execute(&reconciler, command, &config).await;
    if let Err(e) = sessions.cache(&reconciler.snapshot().await) {
        warn!("failed to cache session snapshot, {}", e);
    }
    result
}

async fn open_table<T: Transport>(reconciler: &Reconciler<T>, table: &str) -> anyhow::Result<()> {
    reconciler.refresh_tables(Refresh::Foreground).await?;
    if reconciler.snapshot().await.table(table).is_none() {
        anyhow::bail!("table {} does not exist", table);
    }
    reconciler.select_table(table).await?;
    Ok(())
}

async fn execute<T: Transport>(
    reconciler: &Reconciler<T>,
    command: Commands,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    match command {
        Commands::Tables { filter } => {
            reconciler.refresh_tables(Refresh::Foreground).await?;
            print_tables(&reconciler.snapshot().await, filter.into());
        }
        Commands::Orders { table } => {
            open_table(reconciler, &table).await?;
            print_orders(&reconciler.snapshot().await);
        }
        Commands::Menu { category, search } => {
            let catalog = reconciler.load_menu().await?;
            for cat in &catalog.categories {
                println!("[{}] {}", cat.cat_id, cat.category_name);
            }
            for item in catalog.filter(category.as_deref(), &search) {
                let price = if item.is_free() {
                    "FREE".to_string()
                } else {
                    format!("{} {}", item.effective_price(), item.currency)
                };
                println!(
                    "{:>8}  {:<32} {:>12}  {:?}  {}",
                    item.id,
                    item.food_name,
                    price,
                    item.food_type,
                    item.image_url(&config.image_base_url).unwrap_or_default()
                );
                if item.promotion.is_active() {
                    if let Some(title) = item.promotion.title.as_deref() {
                        println!("          offer: {}", title);
                    }
                }
            }
        }
        Commands::Prefs { food_id, search } => {
            let offered = reconciler.preferences(&food_id).await?;
            for pref in preference::search(&offered, &search) {
                println!("{:>8}  {}", pref.id, pref.name);
            }
        }
        Commands::Open {
            table,
            code,
            password,
            guests,
        } => {
            reconciler.refresh_tables(Refresh::Foreground).await?;
            reconciler
                .create_order(&table, &code.waiter_code, &password, guests)
                .await?;
            println!("opened table {} for {} guest(s)", table, guests);
            print_orders(&reconciler.snapshot().await);
        }
        Commands::Add {
            table,
            food_id,
            qty,
            prefs,
            code,
        } => {
            open_table(reconciler, &table).await?;
            match reconciler.load_menu().await {
                Ok(catalog) => {
                    let dish = catalog
                        .find(&food_id)
                        .with_context(|| format!("food {} is not on the menu", food_id))?;
                    println!("adding {} x {}", qty, dish.food_name);
                }
                Err(e) => warn!("menu unavailable, adding food {} unchecked, {}", food_id, e),
            }
            reconciler
                .add_item(&food_id, qty, &prefs, &code.waiter_code)
                .await?;
            print_orders(&reconciler.snapshot().await);
        }
        Commands::Place { table, code, note } => {
            open_table(reconciler, &table).await?;
            reconciler
                .place_cart_items(&table, &code.waiter_code, &note)
                .await?;
            print_orders(&reconciler.snapshot().await);
        }
        Commands::Confirm {
            table,
            item,
            code,
            note,
        } => {
            open_table(reconciler, &table).await?;
            reconciler
                .confirm_item(&item, &code.waiter_code, &note)
                .await?;
            print_orders(&reconciler.snapshot().await);
        }
        Commands::ConfirmAll { table, code, note } => {
            open_table(reconciler, &table).await?;
            let master_order_id = reconciler
                .snapshot()
                .await
                .master_order_id()
                .with_context(|| format!("table {} has no open order", table))?;
            reconciler
                .confirm_all(&master_order_id, &code.waiter_code, &note)
                .await?;
            print_orders(&reconciler.snapshot().await);
        }
        Commands::Edit {
            table,
            item,
            qty,
            prefs,
        } => {
            open_table(reconciler, &table).await?;
            let state = reconciler.snapshot().await;
            let current = state
                .item(&item)
                .with_context(|| format!("item {} is not on table {}", item, table))?;
            let mut selection = Selection::from_preferences(&current.preferences);
            for name in &prefs {
                selection.toggle(name);
                let mark = if selection.contains(name) { '+' } else { '-' };
                println!("{} {}", mark, name.trim());
            }
            println!("preferences: {}", selection.names().join(", "));
            reconciler
                .edit_item(
                    &item,
                    qty.unwrap_or(current.food_quantity),
                    &selection.to_wire()?,
                )
                .await?;
            print_orders(&reconciler.snapshot().await);
        }
        Commands::Delete { table, item, code } => {
            open_table(reconciler, &table).await?;
            reconciler.delete_item(&item, &code.waiter_code).await?;
            print_orders(&reconciler.snapshot().await);
        }
        Commands::Watch { table } => {
            match &table {
                Some(table) => open_table(reconciler, table).await?,
                None => reconciler.back_to_tables().await,
            }
            watch(reconciler, config).await;
        }
        Commands::Login { .. } | Commands::Logout | Commands::Whoami => {}
    }
    Ok(())
}

async fn watch<T: Transport>(reconciler: &Reconciler<T>, config: &ClientConfig) {
    let cancel_token = CancellationToken::new();
    let tracker = TaskTracker::new();
    let canceller = cancel_token.clone();
    tracker.spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c, {}", e);
        }
        canceller.cancel();
    });

    let scheduler = PollScheduler::new(reconciler, config.poll_interval);
    scheduler
        .run(cancel_token.clone(), |state| match state.view {
            View::Tables => print_tables(state, TableFilter::All),
            View::Table(_) => print_orders(state),
        })
        .await;

    tracker.close();
    tracker.wait().await;
    info!("stopped watching");
}

fn print_tables(state: &ViewState, filter: TableFilter) {
    let counts = TableCounts::of(&state.tables);
    println!(
        "all: {}  occupied: {}  inactive: {}{}",
        counts.all,
        counts.occupied,
        counts.inactive,
        if state.sync_degraded { "  (sync degraded)" } else { "" }
    );
    for table in filter.apply(&state.tables) {
        println!(
            "table {:>4}  {:<9} guests: {:>2}  order: {}",
            table.table_no,
            format!("{:?}", table.status).to_lowercase(),
            table.guest_count,
            table.master_order_id.as_deref().unwrap_or("-")
        );
    }
    for call in &state.waiter_calls {
        println!(
            "! table {} calls: {} {}",
            call.table_no,
            call.request,
            call.called_at.as_deref().unwrap_or("")
        );
    }
}

fn print_orders(state: &ViewState) {
    let Some(table_no) = state.current_table_no() else {
        return;
    };
    println!(
        "table {}  order: {}{}",
        table_no,
        state.master_order_id().as_deref().unwrap_or("-"),
        if state.sync_degraded { "  (sync degraded)" } else { "" }
    );
    let bill: Bill<'_> = state.bill();
    for section in bill.sections.iter().filter(|s| !s.items.is_empty()) {
        println!("-- {} ({})", section.status.label(), section.subtotal);
        for item in &section.items {
            let prefs = item
                .preferences
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  {:>6}  {:>2} x {:<28} {:>10}  {}",
                item.id,
                item.food_quantity,
                item.food_name,
                item.line_total(),
                prefs
            );
        }
    }
    println!("subtotal: {}  tax: {}  total: {}", bill.subtotal, bill.tax, bill.grand_total);
}
