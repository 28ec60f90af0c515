use gridwalk_core::{
    Cell,
    command::{Command, CommandOutcome, parse_script},
    config::WorldConfig,
    follower::FollowerState,
    terrain::{CellType, load_map_from_string},
    world::World,
};
use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    collections::HashSet,
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load
    #[arg(short, long, value_name = "MAP_FILE", default_value = "maps/plaza.txt")]
    map: PathBuf,

    /// Command script run once the map is loaded
    #[arg(short, long, value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// JSON world configuration
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write logs to this file while the UI owns the terminal
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Run without a terminal UI, logging to stderr
    #[arg(long)]
    headless: bool,

    /// Frames to simulate in headless mode
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Milliseconds between frames in the UI
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
}

struct App {
    /// The simulated map.
    world: World,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Frames are not advanced while paused.
    paused: bool,
    /// Last command or interaction result, shown in the status bar.
    status: String,
}

impl App {
    fn new(map_file: &Path, config: WorldConfig) -> Result<Self> {
        let file_string = std::fs::read_to_string(map_file)
            .with_context(|| format!("Failed to read map file {}", map_file.display()))?;
        let (terrain, start_position) =
            load_map_from_string(&file_string).context("Failed to load map")?;

        let mut world = World::new(terrain, config);
        world.spawn(start_position).context("Adding player")?;

        Ok(App {
            world,
            should_quit: false,
            paused: false,
            status: String::from("Ready"),
        })
    }

    /// Executes every command, stopping at the first failure.
    fn run_commands(&mut self, commands: &[Command]) -> Result<()> {
        for command in commands {
            let outcome = command
                .execute(&mut self.world)
                .with_context(|| format!("Command '{command}' failed"))?;
            if outcome == CommandOutcome::NoPath {
                warn!(%command, "no path found");
            }
            self.status = format!("{command}: {outcome:?}");
        }
        Ok(())
    }

    /// Handles one frame of the simulation.
    fn tick(&mut self) {
        if self.paused {
            return;
        }
        self.world.update();
        for request in self.world.drain_animations() {
            info!(
                id = request.target,
                animation = request.animation,
                frame = request.frame,
                "animation requested"
            );
            self.status = format!("#{} plays animation {}", request.target, request.animation);
        }
    }

    fn stop_all(&mut self) {
        self.world.stop_all();
        self.status = String::from("Stopped all pathfinding");
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(&args)?;

    // Ensure the map file exists
    if !args.map.exists() {
        return Err(anyhow::anyhow!(
            "Map file does not exist: {}",
            args.map.display()
        ));
    }

    let config = match &args.config {
        Some(path) => WorldConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => WorldConfig::default(),
    };

    // Create the application state
    let mut app = App::new(&args.map, config)?;
    if let Some(script) = &args.script {
        let text = std::fs::read_to_string(script)
            .with_context(|| format!("Failed to read script {}", script.display()))?;
        let commands = parse_script(&text)?;
        info!(count = commands.len(), "running script");
        app.run_commands(&commands)?;
    }

    if args.headless {
        return run_headless(&mut app, args.ticks);
    }

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Installs the tracing subscriber. Logs go to stderr in headless mode and to
/// `--log-file` otherwise; without a log file the UI runs silently.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

/// Simulates `ticks` frames and prints where every character ended up.
fn run_headless(app: &mut App, ticks: u64) -> Result<()> {
    for _ in 0..ticks {
        app.tick();
        if app
            .world
            .characters()
            .all(|c| c.follower().state() == FollowerState::Idle && !c.is_moving())
        {
            break;
        }
    }
    println!("frame {}", app.world.frame());
    for character in app.world.characters() {
        let position = character.position();
        println!(
            "character {} at ({}, {}){}",
            character.id(),
            position.x,
            position.y,
            if character.is_erased() { " erased" } else { "" }
        );
    }
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        // Draw the UI
        terminal.draw(|f| ui(f, app))?;

        // Calculate timeout for event polling
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char(' ') => app.paused = !app.paused,
                    KeyCode::Char('s') => app.stop_all(),
                    _ => {}
                }
            }
        }

        // Advance a frame if enough time has passed
        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        // Exit loop if requested
        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(70), // Area for the map
            Constraint::Percentage(20), // Area for characters
            Constraint::Percentage(10), // Area for status/help
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], &app.world);
    render_characters(frame, main_layout[1], &app.world);

    let pause = if app.paused { " [paused]" } else { "" };
    let names = app.world.zones().names();
    let zones = if names.is_empty() {
        String::from("none")
    } else {
        names.join(", ")
    };
    let help_text = Paragraph::new(format!(
        "{}{pause} | zones: {zones} | 'space' pause, 's' stop all, 'q'/'Esc' quit",
        app.status
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Lists every character with its position and route progress.
fn render_characters(frame: &mut Frame, area: Rect, world: &World) {
    let rows: Vec<ListItem> = world
        .characters()
        .map(|character| {
            let position = character.position();
            let follower = character.follower();
            let route = match follower.state() {
                FollowerState::Following => format!(
                    "following, {} of {} steps left",
                    follower.remaining().len(),
                    follower.route().len()
                ),
                FollowerState::Idle => String::from("idle"),
            };
            let obstacle = world
                .obstacles()
                .get(character.id())
                .map(|o| format!(" obstacle: {}", o.kind))
                .unwrap_or_default();
            let erased = if character.is_erased() { " (erased)" } else { "" };
            ListItem::from(Line::from(format!(
                "#{} ({}, {}) facing {:?}: {route}{obstacle}{erased}",
                character.id(),
                position.x,
                position.y,
                character.facing()
            )))
        })
        .collect();

    let list =
        List::new(rows).block(Block::default().borders(Borders::ALL).title("Characters"));
    frame.render_widget(list, area);
}

/// Renders terrain, zones, routes, and characters.
fn render_map(frame: &mut Frame, area: Rect, world: &World) {
    let terrain = world.terrain().tiles();
    let zones = world.zones();
    let routes: HashSet<Cell> = world
        .characters()
        .flat_map(|c| c.follower().remaining().iter().copied())
        .collect();

    let mut lines: Vec<Line> = Vec::with_capacity(terrain.height());
    for y in 0..terrain.height() as i32 {
        let mut spans: Vec<Span> = Vec::with_capacity(terrain.width());
        for x in 0..terrain.width() as i32 {
            let cell = Cell::new(x, y);
            let mut style = Style::default();
            if !zones.is_empty() && zones.is_walkable(cell) {
                style = style.bg(Color::Rgb(30, 50, 30));
            }

            let occupant = world
                .events_at(cell)
                .first()
                .copied()
                .map(|id| {
                    if id == 0 {
                        Span::styled("@", style.fg(Color::Red).bold())
                    } else if world.obstacles().get(id).is_some() {
                        Span::styled("o", style.fg(Color::Yellow))
                    } else {
                        Span::styled("e", style.fg(Color::Cyan))
                    }
                });

            let span = if let Some(span) = occupant {
                span
            } else if routes.contains(&cell) {
                Span::styled("·", style.fg(Color::Green))
            } else {
                match terrain.get(cell).copied().unwrap_or_default() {
                    CellType::Floor => Span::styled(" ", style),
                    CellType::Wall => Span::styled("#", style.fg(Color::DarkGray)),
                    CellType::Ledge { .. } => Span::styled("=", style.fg(Color::Blue)),
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let config = world.config();
    let title = format!(
        "gridwalk ({:?}, {} frames/step)",
        config.terrain_rule, config.move_frames
    );
    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
