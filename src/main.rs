//! `icash` command-line client
//!
//! Usage: icash [--config FILE] [--verbose] <command>

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use icash_client::auth::{self, Session, SessionStore};
use icash_client::bet_id::BetIdLinker;
use icash_client::config::{ClientConfig, ENV_DEBUG};
use icash_client::history::{self, HistoryQuery, KindFilter, StatusFilter};
use icash_client::notifications::{self, merge_feed, CouponPager, Inbox, NotificationFeed};
use icash_client::phone::{self, PhoneBook};
use icash_client::utils::logging;
use icash_client::ussd::compute_ussd;
use icash_client::wizard::{
    self, execute, Navigator, NoticeLevel, Notifier, PromptChoice, Route, Selection,
    TerminalAction, TerminalPolicy, ThreadScheduler, Wizard, WizardOptions,
};
use icash_client::{ErrorCode, HttpApiClient, IcashError, IcashResult, Network, Settings, TransactionKind};
use secrecy::SecretString;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "icash")]
#[command(about = "iCASH mobile-money deposits and withdrawals", version)]
struct Cli {
    /// JSON configuration file (defaults to $ICASH_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with an email or phone number (password read from stdin)
    Login {
        identifier: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List enabled betting platforms
    Platforms,
    /// List networks open for a direction
    Networks {
        #[arg(long, value_enum, default_value_t = Direction::Deposit)]
        kind: Direction,
    },
    /// Deposit on a betting platform
    Deposit(TransferArgs),
    /// Withdraw from a betting platform
    Withdraw {
        #[command(flatten)]
        transfer: TransferArgs,
        /// Withdrawal code issued by the platform
        #[arg(long)]
        code: String,
    },
    /// Browse transaction history
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<Direction>,
        /// all, pending, accept, reject or timeout
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Show one transaction
    Show {
        id: u64,
    },
    /// Server notifications merged with the local push inbox
    Notifications {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Published coupons
    Coupons {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Compute a provider USSD code offline from a settings file
    Ussd {
        /// Settings JSON (as returned by the server)
        #[arg(long)]
        settings: PathBuf,
        /// Network name, e.g. "MOOV BENIN"
        #[arg(long)]
        network: String,
        /// 3-digit country code
        #[arg(long)]
        country: String,
        /// Deposit API mode of the network
        #[arg(long, default_value = "connect")]
        mode: String,
        #[arg(long)]
        amount: u64,
    },
}

#[derive(Args, Debug)]
struct TransferArgs {
    /// Platform id or name
    #[arg(long)]
    platform: String,
    /// Bet ID on the platform (linked first if needed)
    #[arg(long)]
    bet_id: String,
    /// Network id or name
    #[arg(long)]
    network: String,
    /// Phone number with country code (registered first if needed)
    #[arg(long)]
    phone: String,
    /// Amount in FCFA
    #[arg(long)]
    amount: u64,
    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,
    /// Never offer a provider USSD prompt; always end on the detail view
    #[arg(long)]
    no_prompt: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Direction {
    Deposit,
    Withdrawal,
}

impl From<Direction> for TransactionKind {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Deposit => TransactionKind::Deposit,
            Direction::Withdrawal => TransactionKind::Withdrawal,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose || std::env::var(ENV_DEBUG).map(|v| logging::debug_flag(&v)).unwrap_or(false) {
        logging::enable_debug();
    }

    if let Err(err) = run(cli) {
        eprintln!("Erreur: {}", describe(&err));
        std::process::exit(1);
    }
}

fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<IcashError>() {
        Some(e) => e.message.clone(),
        None => format!("{:#}", err),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Offline command, no configuration or session needed
    if let Command::Ussd {
        settings,
        network,
        country,
        mode,
        amount,
    } = &cli.command
    {
        return ussd_preview(settings, network, country, mode, *amount);
    }

    let config = ClientConfig::load(cli.config.as_deref())?;
    let store = SessionStore::new(session_path(&config)?);
    let mut session = store.load()?;
    let mut api = HttpApiClient::new(&config)?;
    api.attach_session(&session);

    let result = dispatch(cli.command, &config, &mut api, &mut session, &store);

    if let Err(ref err) = result {
        if let Some(e) = err.downcast_ref::<IcashError>() {
            if e.code == ErrorCode::AuthError && session.is_authenticated() {
                session.expire();
                store.clear()?;
            }
        }
    }
    result
}

fn dispatch(
    command: Command,
    config: &ClientConfig,
    api: &mut HttpApiClient,
    session: &mut Session,
    store: &SessionStore,
) -> anyhow::Result<()> {
    match command {
        Command::Login { identifier } => {
            let password = read_secret("Mot de passe: ")?;
            auth::login(&*api, session, &identifier, &password)?;
            store.save(session)?;
            api.attach_session(session);
            let user = session.require_user()?;
            println!("Connecté en tant que {} ({})", user.full_name(), user.email);
        }
        Command::Logout => {
            session.logout();
            store.clear()?;
            api.detach_session();
            println!("Déconnecté");
        }
        Command::Whoami => {
            let user = auth::refresh_profile(&*api, session)?;
            store.save(session)?;
            println!("{} <{}>", user.full_name(), user.email);
            if let Some(ref phone) = user.phone {
                println!("Téléphone : {}", phone);
            }
            if let Some(ref code) = user.referral_code {
                println!("Code de parrainage : {}", code);
            }
        }
        Command::Platforms => {
            for p in wizard::catalog::platforms(&*api)? {
                println!(
                    "{:<16} {:<24} dépôt {}-{}  retrait {}-{}",
                    p.id, p.name, p.minimun_deposit, p.max_deposit, p.minimun_with, p.max_win
                );
            }
        }
        Command::Networks { kind } => {
            for n in wizard::catalog::networks(&*api, kind.into())? {
                println!(
                    "{:<4} {:<20} pays {:<4} {}",
                    n.id,
                    n.display_name(),
                    n.country_code.as_deref().unwrap_or("-"),
                    n.deposit_api.as_deref().unwrap_or("")
                );
            }
        }
        Command::Deposit(args) => {
            session.require_user()?;
            transfer(config, &*api, TransactionKind::Deposit, args, None)?;
        }
        Command::Withdraw { transfer: args, code } => {
            session.require_user()?;
            transfer(config, &*api, TransactionKind::Withdrawal, args, Some(code))?;
        }
        Command::History {
            page,
            search,
            kind,
            status,
        } => {
            session.require_user()?;
            let mut query = HistoryQuery::new();
            if let Some(term) = search {
                query.set_search(&term);
            }
            if let Some(kind) = kind {
                query.set_kind(KindFilter::Only(kind.into()));
            }
            query.set_status(status.parse::<StatusFilter>().map_err(|e| anyhow!(e))?);
            query.set_page(page);

            let result = history::fetch_page(&*api, &query)?;
            for t in &result.results {
                println!(
                    "#{:<6} {} {:<8} {:<16} {:>14} {}",
                    t.id,
                    t.created_at.format("%d/%m/%Y %H:%M"),
                    t.type_trans.label(),
                    t.status.label(),
                    t.signed_amount(),
                    t.platform_name().unwrap_or("")
                );
            }
            println!("Page {}/{}", query.page(), query.total_pages(result.count));
        }
        Command::Show { id } => {
            session.require_user()?;
            let t = history::fetch_detail(&*api, id)?;
            println!("Transaction #{} ({})", t.id, t.reference);
            println!("  Type      : {}", t.type_trans.label());
            println!("  Statut    : {}", t.status.label());
            println!("  Montant   : {} FCFA", t.amount);
            if let Some(net) = t.net_payable_amout {
                println!("  Net payé  : {} FCFA", net);
            }
            if let Some(ref phone) = t.phone_number {
                println!("  Téléphone : {}", phone);
            }
            if let Some(ref bet_id) = t.user_app_id {
                println!("  ID de pari: {}", bet_id);
            }
            if let Some(ref link) = t.transaction_link {
                println!("  Lien      : {}", link);
            }
            if let Some(ref message) = t.error_message {
                println!("  Erreur    : {}", message);
            }
            println!("  Créée le  : {}", t.created_at.format("%d/%m/%Y %H:%M"));
        }
        Command::Notifications { page } => {
            session.require_user()?;
            let inbox = match config.inbox_file {
                Some(ref path) => Inbox::open(path)?,
                None => Inbox::new(),
            };
            let mut feed = NotificationFeed::new(&*api);
            let server = feed.load(page)?.to_vec();
            let entries = merge_feed(&server, &inbox);
            let unread = entries.iter().filter(|e| !e.is_read()).count();
            for entry in &entries {
                let marker = if entry.is_read() { " " } else { "*" };
                println!(
                    "{} {} {} - {}",
                    marker,
                    entry.created_at().format("%d/%m %H:%M"),
                    entry.title(),
                    entry.content()
                );
            }
            println!("{} non lue(s), page {}", unread, feed.cursor().page);
            if let Some(ad) = notifications::advertisement(&*api)? {
                if let Some(image) = ad.image {
                    println!("Annonce : {}", image);
                }
            }
        }
        Command::Coupons { page } => {
            let mut pager = CouponPager::new(&*api);
            for coupon in pager.load(page)? {
                println!(
                    "{:<16} {:<16} {}",
                    coupon.code,
                    coupon.bet_app.as_deref().unwrap_or("-"),
                    coupon.created_at.format("%d/%m/%Y")
                );
            }
            let cursor = pager.cursor();
            println!(
                "Page {}{}{}",
                cursor.page,
                if cursor.has_previous { " (précédente disponible)" } else { "" },
                if cursor.has_next { " (suivante disponible)" } else { "" }
            );
        }
        Command::Ussd {
            settings,
            network,
            country,
            mode,
            amount,
        } => ussd_preview(&settings, &network, &country, &mode, amount)?,
    }
    Ok(())
}

// =============================================================================
// Transfers
// =============================================================================

fn transfer(
    config: &ClientConfig,
    api: &HttpApiClient,
    kind: TransactionKind,
    args: TransferArgs,
    code: Option<String>,
) -> anyhow::Result<()> {
    let policy = if args.no_prompt {
        TerminalPolicy::LinkOrDetail
    } else {
        TerminalPolicy::ProviderPrompt
    };
    let options = WizardOptions::from_config(config).with_policy(policy);
    let mut wizard = Wizard::new(kind, options.clone(), ThreadScheduler);

    // 1. platform
    let platform = wizard::catalog::find_platform(api, &args.platform)?;
    let help: Vec<(String, String)> = platform
        .help_links(kind)
        .into_iter()
        .map(|(label, link)| (label.to_string(), link.to_string()))
        .collect();
    wizard.commit(Selection::Platform(platform.clone()))?;

    // 2. bet ID
    let linked = wizard::catalog::bet_ids(api, &platform)?;
    let bet_id = match linked.into_iter().find(|b| b.user_app_id == args.bet_id.trim()) {
        Some(existing) => existing,
        None => {
            let mut linker = BetIdLinker::new(api);
            let pending = linker.search(&platform.id, &args.bet_id)?;
            let question = format!("Compte trouvé: {}. Lier cet ID de pari ?", pending.name);
            if !confirm(&question, args.yes)? {
                bail!("ID de pari non confirmé");
            }
            linker.confirm()?
        }
    };
    wizard.commit(Selection::BetId(bet_id))?;

    // 3. network
    let network = find_network(api, kind, &args.network)?;
    wizard.commit(Selection::Network(network.clone()))?;

    // 4. phone
    let wanted = phone::normalize_phone(&args.phone);
    let existing = wizard::catalog::phones(api, &network)?
        .into_iter()
        .find(|p| phone::normalize_phone(&p.phone) == wanted);
    let user_phone = match existing {
        Some(p) => p,
        None => {
            let (country, local) = phone::split_phone(&wanted);
            PhoneBook::new(api).add(&country, &local, network.id)?
        }
    };
    wizard.commit(Selection::Phone(user_phone))?;

    // 5. amount
    wizard.set_amount(args.amount)?;
    if let Some(ref code) = code {
        wizard.set_withdrawal_code(code)?;
    }
    if let Err(e) = wizard.advance() {
        for (label, link) in &help {
            eprintln!("{}: {}", label, link);
        }
        return Err(e.into());
    }

    println!("{}", wizard.review()?);
    if !confirm("Confirmer la transaction ?", args.yes)? {
        wizard.cancel_review()?;
        println!("Transaction annulée");
        return Ok(());
    }

    let mut notifier = ConsoleNotifier;
    let action = wizard.submit(api, &mut notifier)?;
    let action = match action {
        TerminalAction::Prompt(prompt) => {
            println!("{}", prompt.message());
            let choice = if confirm(&format!("Composer avec {} ?", prompt.provider()), args.yes)? {
                PromptChoice::Dial
            } else {
                PromptChoice::Close
            };
            prompt.resolve(choice, &options.terminal)
        }
        other => other,
    };

    execute(&action, &mut ThreadScheduler, &mut ConsoleNavigator);
    Ok(())
}

fn find_network(api: &HttpApiClient, kind: TransactionKind, key: &str) -> IcashResult<Network> {
    let network = wizard::catalog::find_network(api, kind, key)?;
    if let Some(message) = network.message_for(kind) {
        eprintln!("{}", message);
    }
    Ok(network)
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Success => println!("✓ {}", message),
            NoticeLevel::Error => eprintln!("✗ {}", message),
        }
    }
}

struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn dial(&mut self, tel_uri: &str) -> IcashResult<()> {
        println!("Composer : {}", tel_uri);
        Ok(())
    }

    fn open_external(&mut self, url: &str) -> IcashResult<()> {
        println!("Lien de paiement : {}", url);
        Ok(())
    }

    fn go(&mut self, route: &Route) {
        match route {
            Route::TransactionDetail { id } => println!("Suivre la transaction : icash show {}", id),
            Route::Dashboard => println!("Terminé"),
        }
    }
}

// =============================================================================
// Offline USSD preview
// =============================================================================

fn ussd_preview(settings_path: &Path, network: &str, country: &str, mode: &str, amount: u64) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(settings_path)
        .with_context(|| format!("Cannot read settings {}", settings_path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid settings {}", settings_path.display()))?;

    let network = Network {
        id: 0,
        name: network.to_string(),
        public_name: String::new(),
        image: None,
        country_code: Some(country.to_string()),
        active_for_deposit: true,
        active_for_with: false,
        deposit_api: Some(mode.to_string()),
        payment_by_link: false,
        deposit_message: None,
        withdrawal_message: None,
    };

    match compute_ussd(&network, amount, &settings) {
        Some(ussd) => {
            println!("{}", ussd.code);
            println!("{}", ussd.tel_uri());
            println!("{} : {} FCFA composés", ussd.provider, ussd.dialed_amount);
            Ok(())
        }
        None => Err(IcashError::not_found("Aucun code USSD pour ce réseau").into()),
    }
}

// =============================================================================
// Terminal helpers
// =============================================================================

fn session_path(config: &ClientConfig) -> anyhow::Result<PathBuf> {
    if let Some(ref path) = config.session_file {
        return Ok(path.clone());
    }
    let home = std::env::var_os("HOME")
        .ok_or_else(|| anyhow!("HOME is not set; use ICASH_SESSION_FILE"))?;
    Ok(PathBuf::from(home).join(".icash").join("session.json"))
}

fn read_line(prompt: &str) -> anyhow::Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn read_secret(prompt: &str) -> anyhow::Result<SecretString> {
    Ok(SecretString::from(read_line(prompt)?))
}

fn confirm(question: &str, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = read_line(&format!("{} [o/N] ", question))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "o" | "oui" | "y" | "yes"))
}
