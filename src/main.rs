use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use glam::Vec2;
use log::info;

use garden_explorer::{
    Direction, InputState, Intent, KeyCode, NamedKey, TickOutcome, Viewport, World, WorldConfig,
};

#[derive(Parser)]
#[command(name = "garden-explorer")]
#[command(about = "Drive the garden explorer headless from a scene file", long_about = None)]
struct Cli {
    /// Scene XML file
    scene: PathBuf,
    /// World configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Idle frames to run after the script
    #[arg(long, default_value_t = 0)]
    ticks: usize,
    /// Input script, one command per line
    #[arg(long)]
    script: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => WorldConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => WorldConfig::default(),
    };

    let mut world = World::new(config, Viewport::default());
    let summary = world
        .load_file(&cli.scene)
        .with_context(|| format!("failed to load scene {}", cli.scene.display()))?;

    println!(
        "Loaded scene with {} nodes ({} collider triangles, {} interactables)",
        summary.nodes, summary.collider_triangles, summary.interactables
    );
    match &summary.character {
        Some(name) => println!("Character: {name}"),
        None => println!("No character node found; input is ignored"),
    }

    let input = InputState::new();
    if let Some(path) = &cli.script {
        let script = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        let commands = parse_script(&script)?;
        info!("running {} script command(s)", commands.len());
        for command in commands {
            command.apply(&mut world, &input);
        }
    }
    run_frames(&mut world, &input, cli.ticks);

    print_final_state(&world);
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
enum ScriptCommand {
    Press(Direction),
    Release(Direction),
    Key(KeyCode),
    KeyUp(KeyCode),
    Jump,
    Respawn,
    Blur,
    Pointer(Vec2),
    Click,
    Close,
    Tick(usize),
}

impl ScriptCommand {
    fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = parts.collect();
        let command = match (verb, args.as_slice()) {
            ("press", [direction]) => Self::Press(parse_direction(direction)?),
            ("release", [direction]) => Self::Release(parse_direction(direction)?),
            ("key", [name]) => Self::Key(parse_key(name)?),
            ("keyup", [name]) => Self::KeyUp(parse_key(name)?),
            ("jump", []) => Self::Jump,
            ("respawn", []) => Self::Respawn,
            ("blur", []) => Self::Blur,
            ("pointer", [x, y]) => Self::Pointer(Vec2::new(
                x.parse().with_context(|| format!("invalid x coordinate {x:?}"))?,
                y.parse().with_context(|| format!("invalid y coordinate {y:?}"))?,
            )),
            ("click", []) => Self::Click,
            ("close", []) => Self::Close,
            ("tick", []) => Self::Tick(1),
            ("tick", [count]) => Self::Tick(
                count
                    .parse()
                    .with_context(|| format!("invalid tick count {count:?}"))?,
            ),
            _ => bail!("unknown command {line:?}"),
        };
        Ok(Some(command))
    }

    /// Input commands only touch the input state; they take effect on the
    /// next `tick`.
    fn apply(&self, world: &mut World, input: &InputState) {
        match self {
            Self::Press(direction) => input.set_direction(*direction, true),
            Self::Release(direction) => input.set_direction(*direction, false),
            Self::Key(key) => input.key_down(*key),
            Self::KeyUp(key) => input.key_up(*key),
            Self::Jump => input.key_down(KeyCode::Named(NamedKey::Space)),
            Self::Respawn => input.key_down(KeyCode::Character('R')),
            Self::Blur => input.blur(),
            Self::Pointer(position) => input.set_pointer_position(*position),
            Self::Click => input.click(),
            Self::Close => input.key_down(KeyCode::Named(NamedKey::Escape)),
            Self::Tick(count) => run_frames(world, input, *count),
        }
    }
}

fn parse_script(script: &str) -> Result<Vec<ScriptCommand>> {
    let mut commands = Vec::new();
    for (line_no, line) in script.lines().enumerate() {
        if let Some(command) = ScriptCommand::parse(line)
            .with_context(|| format!("script line {}", line_no + 1))?
        {
            commands.push(command);
        }
    }
    Ok(commands)
}

fn parse_direction(name: &str) -> Result<Direction> {
    Direction::from_name(name).ok_or_else(|| anyhow!("unknown direction {name:?}"))
}

fn parse_key(name: &str) -> Result<KeyCode> {
    KeyCode::from_name(name).ok_or_else(|| anyhow!("unknown key {name:?}"))
}

fn run_frames(world: &mut World, input: &InputState, count: usize) {
    for _ in 0..count {
        let report = world.frame(&input.take_snapshot());
        if report.tick == Some(TickOutcome::Respawned) {
            println!("Respawned character");
        }
        match report.intent {
            Some(Intent::InfoPanel { id, content }) => {
                println!("Intent: info panel {id} \"{}\"", content.title);
            }
            Some(Intent::ReactiveAnimation { target, duration }) => {
                println!("Intent: reactive animation {target} ({duration:.2}s)");
            }
            None => {}
        }
    }
}

fn print_final_state(world: &World) {
    println!("Final character state:");
    let Some(character) = world.character() else {
        println!(" - not loaded");
        return;
    };
    println!(
        " - pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2}) yaw={:.2} grounded={} moving={}",
        character.position.x,
        character.position.y,
        character.position.z,
        character.velocity.x,
        character.velocity.y,
        character.velocity.z,
        character.yaw,
        character.grounded,
        character.moving
    );
    println!(" - overlay open: {}", world.overlay_open());
}
