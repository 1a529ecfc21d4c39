// Capture via un sous-processus ffmpeg (std::process::Command), sans lier libav.
// Prérequis : `ffmpeg` (et `ffprobe` pour les fichiers) accessibles dans PATH.
//
// Architecture :
//   - `probe_video`    : interroge ffprobe pour obtenir width/height/fps d'un fichier
//   - `ffmpeg_args`    : arguments ffmpeg → flux RGBA brut sur stdout (webcam ou fichier)
//   - `StreamSource`   : lance ffmpeg + un thread lecteur, frames via canal flume borné
//   - `capture_loop`   : thread dédié, lit les frames, gère `StreamCommand::Quit`
//   - `publish_latest` : canal plein → la frame la plus ancienne est évincée

use anyhow::{Context, Result};
use flume::{Receiver, Sender, TryRecvError, TrySendError};
use gc_core::frame::FrameBuffer;
use gc_core::traits::Source;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;

use crate::resize::fit_width;

/// Résolution demandée à la webcam.
pub const CAMERA_WIDTH: u32 = 640;
/// Résolution demandée à la webcam.
pub const CAMERA_HEIGHT: u32 = 480;

/// Largeur max du pipe pour un fichier vidéo (bande passante du pipe).
const MAX_FILE_WIDTH: u32 = 640;

/// Capacité du canal de frames. Plein → la plus ancienne est évincée.
const FRAME_CHANNEL_CAP: usize = 3;

/// Taille du pool de frames pré-allouées.
/// Doit être > capacité du canal pour garantir un slot libre sans allocation.
const POOL_SIZE: usize = 6;

#[cfg(target_os = "linux")]
const CAMERA_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
const CAMERA_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const CAMERA_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CAMERA_FORMAT: &str = "v4l2";

/// Ce que ffmpeg doit décoder.
///
/// # Example
/// ```
/// use gc_source::stream::StreamInput;
/// assert!(StreamInput::camera(None).is_live());
/// assert!(!StreamInput::File("clip.mp4".into()).is_live());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamInput {
    /// Périphérique webcam (`/dev/video0`, `0`, `video=…` selon l'OS).
    Camera(String),
    /// Fichier vidéo lu en temps réel.
    File(PathBuf),
}

impl StreamInput {
    /// Webcam, périphérique par défaut de l'OS si `None`.
    #[must_use]
    pub fn camera(device: Option<&str>) -> Self {
        Self::Camera(device.map_or_else(default_camera_device, str::to_string))
    }

    /// Webcam = infinie, fichier = fini.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Camera(_))
    }
}

/// Périphérique webcam par défaut de la plateforme.
#[must_use]
pub fn default_camera_device() -> String {
    if cfg!(target_os = "macos") {
        "0".to_string()
    } else if cfg!(target_os = "windows") {
        "video=Integrated Camera".to_string()
    } else {
        "/dev/video0".to_string()
    }
}

/// Commandes pour le thread de capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCommand {
    /// Arrêter le thread et ffmpeg proprement.
    Quit,
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamInfo {
    /// Largeur native du flux, en pixels.
    pub width: u32,
    /// Hauteur native du flux, en pixels.
    pub height: u32,
    /// Images par seconde (ex: 23.976, 30.0).
    pub fps: f64,
}

impl StreamInfo {
    /// FPS demandé à ffmpeg pour ce fichier : `target`, sans dépasser le rythme natif.
    ///
    /// # Example
    /// ```
    /// use gc_source::stream::StreamInfo;
    /// let info = StreamInfo { width: 1920, height: 1080, fps: 23.976 };
    /// assert_eq!(info.output_fps(30), 24);
    /// assert_eq!(info.output_fps(12), 12);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn output_fps(&self, target: u32) -> u32 {
        let native = if self.fps.is_finite() {
            self.fps.round().clamp(1.0, 120.0) as u32
        } else {
            30
        };
        native.min(target.clamp(1, 120))
    }
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<StreamInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&text).with_context(|| {
        format!(
            "ffprobe n'a trouvé aucun flux vidéo dans {}",
            path.display()
        )
    })?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps — {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Parse la sortie `key=value` de ffprobe. Largeur ou hauteur absente/nulle → `None`.
fn parse_probe_output(text: &str) -> Option<StreamInfo> {
    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut fps: f64 = 30.0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        }
    }

    (width > 0 && height > 0).then_some(StreamInfo { width, height, fps })
}

/// Arguments ffmpeg produisant des frames RGBA brutes `width × height` sur stdout.
///
/// Webcam : format d'entrée de l'OS, options basse latence.
/// Fichier : `-re` pour une lecture au rythme natif, `-r` pour le fps de sortie.
///
/// # Example
/// ```
/// use gc_source::stream::{ffmpeg_args, StreamInput};
/// let args = ffmpeg_args(&StreamInput::File("clip.mp4".into()), 320, 240, 30);
/// assert!(args.iter().any(|a| a == "scale=320:240:flags=bilinear"));
/// assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
/// ```
#[must_use]
pub fn ffmpeg_args(input: &StreamInput, width: u32, height: u32, fps: u32) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let fps = fps.clamp(1, 120).to_string();

    match input {
        StreamInput::Camera(device) => {
            let size = format!("{CAMERA_WIDTH}x{CAMERA_HEIGHT}");
            let device = camera_input(device);
            args.extend(
                [
                    "-f",
                    CAMERA_FORMAT,
                    "-framerate",
                    fps.as_str(),
                    "-video_size",
                    size.as_str(),
                    "-fflags",
                    "nobuffer",
                    "-flags",
                    "low_delay",
                    "-i",
                    device.as_str(),
                ]
                .map(String::from),
            );
        }
        StreamInput::File(path) => {
            let file = path.to_string_lossy().into_owned();
            args.extend(["-re", "-i", file.as_str(), "-r", fps.as_str()].map(String::from));
        }
    }

    let scale = format!("scale={width}:{height}:flags=bilinear");
    args.extend(
        [
            "-vf",
            scale.as_str(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ]
        .map(String::from),
    );
    args
}

/// Nom de périphérique au format attendu par le démuxeur de l'OS.
fn camera_input(device: &str) -> String {
    match CAMERA_FORMAT {
        "avfoundation" if !device.contains(':') => format!("{device}:none"),
        "dshow" if !device.starts_with("video=") => format!("video={device}"),
        _ => device.to_string(),
    }
}

/// Lance `ffmpeg` avec stdout en pipe.
///
/// # Errors
/// Retourne une erreur si ffmpeg est introuvable ou ne démarre pas.
pub fn spawn_ffmpeg(args: &[String]) -> Result<Child> {
    let child = Command::new("ffmpeg")
        .args(args)
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Impossible de lancer ffmpeg. Vérifiez qu'il est installé et dans le PATH.")?;
    log::debug!("ffmpeg spawné: {}", args.join(" "));
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false), // EOF
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Trouve ou crée un slot libre dans le pool.
///
/// Invariant : retourne un index `i` tel que `Arc::strong_count(&pool[i]) == 1`.
fn find_or_create_slot(pool: &mut Vec<Arc<FrameBuffer>>, w: u32, h: u32) -> usize {
    if let Some(i) = pool.iter().position(|a| Arc::strong_count(a) == 1) {
        i
    } else {
        // Pool saturé : allouer plutôt que bloquer.
        pool.push(Arc::new(FrameBuffer::new(w, h)));
        pool.len() - 1
    }
}

/// Retourne `true` si le thread doit quitter (Quit reçu ou canal déconnecté).
fn should_quit(cmd_rx: &Receiver<StreamCommand>) -> bool {
    match cmd_rx.try_recv() {
        Ok(StreamCommand::Quit) => {
            log::info!("Thread capture: Quit reçu, arrêt propre.");
            true
        }
        Err(TryRecvError::Empty) => false,
        Err(TryRecvError::Disconnected) => true,
    }
}

/// Envoie `frame` sans jamais bloquer le lecteur de pipe.
///
/// Canal plein : la frame la plus ancienne est retirée via `drain` (un clone
/// du récepteur), puis l'envoi est retenté. Retourne `false` si le canal est
/// déconnecté.
fn publish_latest(
    frame_tx: &Sender<Arc<FrameBuffer>>,
    drain: &Receiver<Arc<FrameBuffer>>,
    frame: Arc<FrameBuffer>,
) -> bool {
    let mut pending = frame;
    loop {
        match frame_tx.try_send(pending) {
            Ok(()) => return true,
            Err(TrySendError::Full(back)) => {
                if drain.try_recv().is_ok() {
                    log::trace!("Canal plein : frame la plus ancienne évincée");
                }
                pending = back;
            }
            Err(TrySendError::Disconnected(_)) => return false,
        }
    }
}

/// Lit des frames RGBA `w × h` depuis `reader` jusqu'à EOF, erreur ou `Quit`.
fn pump_frames<R: Read>(
    reader: &mut R,
    w: u32,
    h: u32,
    frame_tx: &Sender<Arc<FrameBuffer>>,
    drain: &Receiver<Arc<FrameBuffer>>,
    cmd_rx: &Receiver<StreamCommand>,
    live: bool,
) {
    let frame_bytes = FrameBuffer::required_len(w, h, gc_core::frame::PixelLayout::Rgba);
    let mut pool: Vec<Arc<FrameBuffer>> = (0..POOL_SIZE)
        .map(|_| Arc::new(FrameBuffer::new(w, h)))
        .collect();

    loop {
        if should_quit(cmd_rx) {
            break;
        }

        let idx = find_or_create_slot(&mut pool, w, h);
        let Some(fb) = Arc::get_mut(&mut pool[idx]) else {
            continue;
        };

        match read_exact_or_eof(reader, &mut fb.data[..frame_bytes]) {
            Ok(true) => {
                if !publish_latest(frame_tx, drain, Arc::clone(&pool[idx])) {
                    break;
                }
            }
            Ok(false) => {
                if live {
                    log::warn!("Thread capture: flux webcam interrompu.");
                } else {
                    log::info!("Thread capture: EOF, dernière frame conservée.");
                }
                break;
            }
            Err(e) => {
                log::warn!("Thread capture: erreur lecture pipe: {e}");
                break;
            }
        }
    }
}

/// Boucle principale du thread de capture.
fn capture_loop(
    mut child: Child,
    w: u32,
    h: u32,
    frame_tx: &Sender<Arc<FrameBuffer>>,
    drain: &Receiver<Arc<FrameBuffer>>,
    cmd_rx: &Receiver<StreamCommand>,
    live: bool,
) {
    if let Some(mut stdout) = child.stdout.take() {
        pump_frames(&mut stdout, w, h, frame_tx, drain, cmd_rx, live);
    } else {
        log::error!("Thread capture: stdout ffmpeg indisponible");
    }

    let _ = child.kill();
    let _ = child.wait();
    log::info!("Thread capture terminé proprement.");
}

/// Source vidéo alimentée par ffmpeg : webcam ou fichier.
///
/// `next_frame` retourne `None` tant qu'aucune frame n'est arrivée, puis
/// toujours la plus récente (la dernière reste affichée en fin de fichier).
pub struct StreamSource {
    frame_rx: Receiver<Arc<FrameBuffer>>,
    cmd_tx: Sender<StreamCommand>,
    latest: Option<Arc<FrameBuffer>>,
    size: (u32, u32),
    live: bool,
}

impl StreamSource {
    /// Lance ffmpeg et le thread de capture.
    ///
    /// # Errors
    /// Retourne une erreur si ffprobe/ffmpeg sont introuvables, si le fichier
    /// n'a pas de flux vidéo, ou si le thread ne peut pas être créé.
    pub fn open(input: StreamInput, fps: u32) -> Result<Self> {
        let (w, h, fps) = match &input {
            StreamInput::Camera(_) => (CAMERA_WIDTH, CAMERA_HEIGHT, fps),
            StreamInput::File(path) => {
                let info = probe_video(path)?;
                let (w, h) = fit_width(info.width, info.height, MAX_FILE_WIDTH);
                (w, h, info.output_fps(fps))
            }
        };
        let live = input.is_live();
        let child = spawn_ffmpeg(&ffmpeg_args(&input, w, h, fps))?;

        let (frame_tx, frame_rx) = flume::bounded(FRAME_CHANNEL_CAP);
        let drain = frame_rx.clone();
        let (cmd_tx, cmd_rx) = flume::bounded(4);

        // Détaché : s'arrête sur Quit ou quand `cmd_tx` disparaît avec la source.
        thread::Builder::new()
            .name("gc-capture".to_string())
            .spawn(move || capture_loop(child, w, h, &frame_tx, &drain, &cmd_rx, live))
            .context("Impossible de spawner le thread de capture")?;

        log::info!("Capture démarrée : {input:?} → {w}x{h}");
        Ok(Self::from_channels(frame_rx, cmd_tx, (w, h), live))
    }

    fn from_channels(
        frame_rx: Receiver<Arc<FrameBuffer>>,
        cmd_tx: Sender<StreamCommand>,
        size: (u32, u32),
        live: bool,
    ) -> Self {
        Self {
            frame_rx,
            cmd_tx,
            latest: None,
            size,
            live,
        }
    }
}

impl Source for StreamSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        // Vide le canal : seule la plus récente compte.
        while let Ok(frame) = self.frame_rx.try_recv() {
            self.latest = Some(frame);
        }
        self.latest.clone()
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for StreamSource {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(StreamCommand::Quit);
    }
}
