use crate::quickstart::QuickStart;
use crate::store::Store;
use anyhow::Result;
use keytouch_core::{MappingTable, SessionConfig};

pub fn session_config(qs: &QuickStart) -> SessionConfig {
    SessionConfig {
        keepalive_ms: qs.keepalive_ms,
        quit_hotkey: qs.quit_hotkey.clone(),
        target: qs.target.clone(),
        focus_gating: qs.focus_gating,
        ..SessionConfig::default()
    }
}

/// Load the mapping and run one session until the quit hotkey.
pub fn start(store: &Store, qs: &QuickStart) -> Result<()> {
    let mapping = store.load(&qs.filename)?;
    run(mapping, &session_config(qs))
}

#[cfg(windows)]
fn run(mapping: MappingTable, config: &SessionConfig) -> Result<()> {
    use anyhow::Context;
    use keytouch_core::focus::ForegroundProbe;
    use keytouch_core::keyboard_hook::KeyboardListener;
    use keytouch_core::touch_injection::WindowsTouchPlatform;
    use keytouch_core::{run_session, FocusProbe, Session};
    use tracing::info;

    let probe: Box<dyn FocusProbe> = Box::new(ForegroundProbe);
    let session = Session::from_config(mapping, WindowsTouchPlatform::new(), config, Some(probe));
    let (mut listener, events) =
        KeyboardListener::channel(config.channel_capacity, config.quit_hotkey.clone())
            .context("starting keyboard listener")?;
    match &config.target {
        Some(target) => info!("Mapping active for {}. Press {} to stop.", target, config.quit_hotkey),
        None => info!("Mapping active. Press {} to stop.", config.quit_hotkey),
    }

    let result = run_session(&session, &events);
    listener.stop();
    result.context("session aborted")?;
    Ok(())
}

#[cfg(not(windows))]
fn run(_mapping: MappingTable, _config: &SessionConfig) -> Result<()> {
    anyhow::bail!("touch injection is only available on Windows")
}

/// Map creator with the click position read from the real cursor.
#[cfg(windows)]
pub fn create(store: &Store, name: &str) -> Result<()> {
    use keytouch_core::cursor::wait_for_click;

    if store.exists(name) {
        anyhow::bail!("mapping {} already exists", name);
    }
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    let table = crate::creator::record(&mut input, &mut out, || Ok(wait_for_click()?))?;
    let path = store.save(name, &table)?;
    println!("saved {}", path.display());
    Ok(())
}

#[cfg(not(windows))]
pub fn create(_store: &Store, _name: &str) -> Result<()> {
    anyhow::bail!("the map creator needs Windows cursor capture")
}
