use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sequia::chart::{ChartKind, ChartSurface, MemorySurface};
use sequia::storage::{self, ExportRow};
use sequia::viz::{self, SvgSurface};
use sequia::{
    AnalysisController, Catalog, Client, FileStore, LanguageSwitcher, Locale, MemoryStore,
    Outcome, Page, PreferenceStore, Settings,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "sequia",
    version,
    about = "Drought-risk analysis for the municipalities of Chihuahua"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one municipality (and optionally write charts, export, print stats).
    Analyze(AnalyzeArgs),
    /// List the municipalities the service knows about.
    Municipios(ServiceArgs),
    /// Show or persist the preferred language.
    Lang(LangArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Base URL of the analysis API.
    #[arg(long, env = "SEQUIA_API_URL", default_value = sequia::api::DEFAULT_BASE_URL)]
    api_url: String,
    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Args, Debug)]
struct PrefArgs {
    /// Preference file (defaults to the user config directory).
    #[arg(long, env = "SEQUIA_PREFS")]
    prefs: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Municipality name as the service spells it (e.g., Guachochi)
    municipio: String,
    #[command(flatten)]
    service: ServiceArgs,
    #[command(flatten)]
    prefs: PrefArgs,
    /// Language: es, tara or rara. Defaults to the stored preference.
    #[arg(long, env = "SEQUIA_LANG")]
    lang: Option<Locale>,
    /// TTF font for chart text; without one charts carry no text.
    #[arg(long, env = "SEQUIA_FONT")]
    font: Option<PathBuf>,
    /// Write chart SVGs into this directory.
    #[arg(long)]
    charts: Option<PathBuf>,
    /// Width of each chart (default 900).
    #[arg(long, default_value_t = 900)]
    width: u32,
    /// Height of each chart (default 480).
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Save the series and projection to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, `.json` files get JSON and anything else CSV.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Sum the daily series per month when the response has no monthly averages.
    #[arg(long, default_value_t = false)]
    derive_monthly: bool,
    /// Print rain statistics and the regression to stdout.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

#[derive(Args, Debug)]
struct LangArgs {
    /// Language to store; omit to print the current one.
    locale: Option<Locale>,
    #[command(flatten)]
    prefs: PrefArgs,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Analyze(args) => cmd_analyze(args),
        Command::Municipios(args) => cmd_municipios(args),
        Command::Lang(args) => cmd_lang(args),
    }
}

fn open_store(args: &PrefArgs) -> Result<Box<dyn PreferenceStore>> {
    match args.prefs.clone().or_else(FileStore::default_path) {
        Some(path) => Ok(Box::new(
            FileStore::open(&path).with_context(|| format!("open {}", path.display()))?,
        )),
        None => Ok(Box::new(MemoryStore::default())),
    }
}

fn client(args: &ServiceArgs) -> Result<Client> {
    Client::new(args.api_url.as_str(), Duration::from_secs(args.timeout))
        .context("build HTTP client")
}

fn cmd_analyze(args: AnalyzeArgs) -> Result<()> {
    let settings = Settings {
        api_base: args.service.api_url.clone(),
        timeout: Duration::from_secs(args.service.timeout),
        chart_width: args.width,
        chart_height: args.height,
        chart_dir: args.charts.clone(),
        derive_monthly: args.derive_monthly,
        ..Settings::default()
    };

    if let Some(font) = args.font.as_ref()
        && let Err(e) = viz::register_font_file(font)
    {
        log::warn!("{e:#}; charts will carry no text");
    }

    let surface: Box<dyn ChartSurface> = match settings.chart_dir.as_ref() {
        Some(dir) => Box::new(SvgSurface::new(dir, settings.chart_width, settings.chart_height)?),
        None => Box::new(MemorySurface::default()),
    };
    let mut page = Page::new(surface);
    let mut store = open_store(&args.prefs)?;
    let catalog = Catalog::builtin();
    let switcher = LanguageSwitcher::new(catalog);
    match args.lang {
        Some(locale) => switcher.switch(&mut page, store.as_mut(), locale),
        None => {
            switcher.initialize(&mut page, store.as_mut());
        }
    }

    let client = Client::new(settings.api_base.as_str(), settings.timeout)
        .context("build HTTP client")?;
    let mut controller = AnalysisController::new(client, catalog)
        .with_policy(settings.policy)
        .with_derived_monthly(settings.derive_monthly);

    let view = match controller.submit(&mut page, &args.municipio) {
        Outcome::Displayed(view) => view,
        Outcome::Failed(e) => {
            let msg = page.view.error_message().map(str::to_string);
            bail!("{}", msg.unwrap_or_else(|| e.to_string()))
        }
        Outcome::Discarded => bail!("analysis superseded"),
    };

    print!("{}", page.view.report());

    if let Some(dir) = settings.chart_dir.as_ref() {
        for kind in &view.charts {
            eprintln!("Wrote {}", dir.join(format!("{}.svg", kind.mount_id())).display());
        }
        if let Some(svg) = page.view.element(sequia::ElementId::RiskCanvas).content.as_ref() {
            let path = dir.join("riskCanvas.svg");
            std::fs::write(&path, svg).with_context(|| format!("write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
    }
    for kind in &view.chart_failures {
        eprintln!("Chart {kind:?} could not be rendered");
    }

    if let Some(path) = args.out.as_ref() {
        let rows: Vec<ExportRow> =
            storage::export_rows(&view.series, view.regression.as_ref().ok(), &view.projection);
        match args.format {
            Some(OutFormat::Csv) => storage::save_csv(&rows, path)?,
            Some(OutFormat::Json) => storage::save_json(&rows, path)?,
            None => storage::save(&rows, path)?,
        }
        eprintln!("Saved {} rows to {}", rows.len(), path.display());
    }

    if args.stats {
        let r = view.rain;
        println!(
            "days={} rainy={} rainy_pct={:.1}",
            r.total_days, r.rainy_days, r.rainy_pct
        );
        match &view.regression {
            Ok(m) => println!(
                "slope={:.4} intercept={:.4} r2={}",
                m.slope,
                m.intercept,
                m.r_squared.map(|v| format!("{v:.3}")).unwrap_or_else(|| "n/a".into())
            ),
            Err(e) => println!("regression: {e}"),
        }
        if let Some(last) = view.projection.last() {
            println!("projection {} -> {:.2} mm", last.date, last.predicted_mm);
        }
        let live: Vec<ChartKind> = page.charts.live_kinds().collect();
        println!("charts={live:?}");
    }

    Ok(())
}

fn cmd_municipios(args: ServiceArgs) -> Result<()> {
    let names = client(&args)?.municipalities()?;
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn cmd_lang(args: LangArgs) -> Result<()> {
    let mut store = open_store(&args.prefs)?;
    match args.locale {
        Some(locale) => {
            store.set(sequia::store::LOCALE_KEY, locale.code())?;
            println!("{locale}");
        }
        None => {
            let current = store
                .get(sequia::store::LOCALE_KEY)
                .and_then(|c| c.parse::<Locale>().ok())
                .unwrap_or(Locale::DEFAULT);
            println!("{current}");
        }
    }
    Ok(())
}
