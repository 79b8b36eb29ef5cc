pub mod types;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::WatchStream;

use crate::ir::gree::types::{
    Celsius, FanSpeed, InvalidFanSpeed, InvalidMode, InvalidSwingState, Mode, SwingState,
};
use crate::ir::gree::{gree_packet, Gree};
use crate::ir::output::{Transmit, TransmitError};

const REQUEST_BUFFER: usize = 16;

#[derive(Error, Debug)]
pub enum ClimateError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("This unit has no swing support")]
    CapabilityUnsupported,
    #[error(transparent)]
    Transmit(#[from] TransmitError),
    #[error("Could not communicate with the climate task")]
    Send,
}

impl From<InvalidMode> for ClimateError {
    fn from(e: InvalidMode) -> Self {
        ClimateError::InvalidArgument(e.to_string())
    }
}

impl From<InvalidFanSpeed> for ClimateError {
    fn from(e: InvalidFanSpeed) -> Self {
        ClimateError::InvalidArgument(e.to_string())
    }
}

impl From<InvalidSwingState> for ClimateError {
    fn from(e: InvalidSwingState) -> Self {
        ClimateError::InvalidArgument(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClimateError>;

/// Snapshot of one unit's desired state plus the mirrored sensor reading.
#[derive(Clone, Debug, PartialEq)]
pub struct ClimateStatus {
    pub powered: bool,
    pub mode: Mode,
    pub target_temperature: u8,
    pub fan: FanSpeed,
    pub swing: Option<SwingState>,
    pub current_temperature: Option<f32>,
}

/// Controller for one physical unit: the single source of truth for its
/// desired state.
///
/// Every mutation follows the same protocol: validate, mutate, encode,
/// dispatch. Dispatch failures leave the mutated state in place; the
/// infrared medium carries no acknowledgement, so this state is what the
/// unit is intended to run, never what it confirmed.
pub struct Climate<T: Transmit> {
    name: String,
    state: Gree,
    current_temperature: Option<f32>,
    out: T,
}

impl<T: Transmit> Climate<T> {
    pub fn new(name: impl Into<String>, swing_capable: bool, out: T) -> Climate<T> {
        Climate {
            name: name.into(),
            state: Gree::new(swing_capable),
            current_temperature: None,
            out,
        }
    }

    pub fn status(&self) -> ClimateStatus {
        ClimateStatus {
            powered: self.state.powered(),
            mode: self.state.mode,
            target_temperature: u8::from(self.state.temperature),
            fan: self.state.fan,
            swing: self.state.swing,
            current_temperature: self.current_temperature,
        }
    }

    /// Sends the baseline off command so the unit starts from a known
    /// state. Nothing can be read back from the hardware, so this runs
    /// unconditionally, independent of the in-memory state.
    pub async fn sync_startup(&mut self) -> Result<()> {
        info!("{}: synchronizing unit to the off baseline", self.name);
        let baseline = Gree::new(self.state.swing.is_some());
        self.dispatch(&baseline).await
    }

    /// Clamps silently and dispatches even when the value did not change,
    /// so a lost command can be re-asserted.
    pub async fn set_temperature(&mut self, value: f64) -> Result<()> {
        self.state.temperature = Celsius::clamped(value);
        self.send_state().await
    }

    pub async fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.state.mode = mode;
        self.send_state().await
    }

    pub async fn set_fan_speed(&mut self, fan: FanSpeed) -> Result<()> {
        self.state.fan = fan;
        self.send_state().await
    }

    pub async fn set_swing(&mut self, swing: SwingState) -> Result<()> {
        if self.state.swing.is_none() {
            return Err(ClimateError::CapabilityUnsupported);
        }
        self.state.swing = Some(swing);
        self.send_state().await
    }

    pub async fn set_mode_name(&mut self, token: &str) -> Result<()> {
        let mode = token.parse::<Mode>()?;
        self.set_mode(mode).await
    }

    pub async fn set_fan_speed_name(&mut self, token: &str) -> Result<()> {
        let fan = token.parse::<FanSpeed>()?;
        self.set_fan_speed(fan).await
    }

    pub async fn set_swing_name(&mut self, token: &str) -> Result<()> {
        let swing = token.parse::<SwingState>()?;
        self.set_swing(swing).await
    }

    /// Powering on from off always lands in cool mode, not whatever mode
    /// was active before the last power-off.
    pub async fn turn_on(&mut self) -> Result<()> {
        if self.state.mode.is_off() {
            self.state.mode = Mode::Cool;
        }
        self.send_state().await
    }

    pub async fn turn_off(&mut self) -> Result<()> {
        self.state.mode = Mode::Off;
        self.send_state().await
    }

    /// Mirrors an external sensor reading. The AC reports nothing itself.
    pub fn update_current_temperature(&mut self, value: f32) {
        self.current_temperature = Some(value);
    }

    async fn send_state(&mut self) -> Result<()> {
        let state = self.state.clone();
        self.dispatch(&state).await
    }

    async fn dispatch(&mut self, state: &Gree) -> Result<()> {
        let frame = state.frame();
        let packet = gree_packet(frame);
        debug!(
            "{}: sending frame [{}] as a {} byte payload",
            self.name,
            frame.to_string(),
            packet.len()
        );
        self.out.transmit(packet).await.map_err(|e| {
            error!("{}: could not deliver command: {}", self.name, e);
            ClimateError::from(e)
        })
    }
}

#[derive(Clone, Debug)]
pub enum ClimateRequest {
    SetTemperature(f64),
    SetMode(Mode),
    SetFanSpeed(FanSpeed),
    SetSwing(SwingState),
    TurnOn,
    TurnOff,
    UpdateCurrentTemperature(f32),
    Stop,
}

type RequestEnvelope = (ClimateRequest, oneshot::Sender<Result<()>>);

impl<T: Transmit + 'static> Climate<T> {
    /// Starts the device task. Requests are applied strictly in arrival
    /// order; each one is encoded and dispatched before the next is taken
    /// off the queue, so at most one command is ever in flight to the
    /// transmitter. The startup synchronization command goes out first.
    pub fn spawn(mut self) -> ClimateHandle {
        let (request_sender, mut request_receiver) = mpsc::channel::<RequestEnvelope>(REQUEST_BUFFER);
        let (status_sender, status_receiver) = watch::channel(self.status());
        tokio::spawn(async move {
            if let Err(e) = self.sync_startup().await {
                warn!("{}: startup synchronization failed: {}", self.name, e);
            }
            while let Some((request, reply)) = request_receiver.recv().await {
                let stop = matches!(request, ClimateRequest::Stop);
                let result = self.apply(request).await;
                let _ = status_sender.send(self.status());
                let _ = reply.send(result);
                if stop {
                    info!("{}: climate task stopping", self.name);
                    break;
                }
            }
        });
        ClimateHandle {
            request_sender,
            status_receiver,
        }
    }

    async fn apply(&mut self, request: ClimateRequest) -> Result<()> {
        match request {
            ClimateRequest::SetTemperature(value) => self.set_temperature(value).await,
            ClimateRequest::SetMode(mode) => self.set_mode(mode).await,
            ClimateRequest::SetFanSpeed(fan) => self.set_fan_speed(fan).await,
            ClimateRequest::SetSwing(swing) => self.set_swing(swing).await,
            ClimateRequest::TurnOn => self.turn_on().await,
            ClimateRequest::TurnOff => self.turn_off().await,
            ClimateRequest::UpdateCurrentTemperature(value) => {
                self.update_current_temperature(value);
                Ok(())
            }
            ClimateRequest::Stop => Ok(()),
        }
    }
}

/// Host-platform surface for a spawned device task. Clones share the same
/// queue, so all callers funnel through one serialized dispatch path.
#[derive(Clone, Debug)]
pub struct ClimateHandle {
    request_sender: mpsc::Sender<RequestEnvelope>,
    status_receiver: watch::Receiver<ClimateStatus>,
}

impl ClimateHandle {
    pub async fn request(&self, request: ClimateRequest) -> Result<()> {
        let (reply_sender, reply_receiver) = oneshot::channel();
        self.request_sender
            .send((request, reply_sender))
            .await
            .map_err(|_| ClimateError::Send)?;
        reply_receiver.await.map_err(|_| ClimateError::Send)?
    }

    pub async fn set_temperature(&self, value: f64) -> Result<()> {
        self.request(ClimateRequest::SetTemperature(value)).await
    }

    pub async fn set_mode(&self, mode: Mode) -> Result<()> {
        self.request(ClimateRequest::SetMode(mode)).await
    }

    pub async fn set_fan_speed(&self, fan: FanSpeed) -> Result<()> {
        self.request(ClimateRequest::SetFanSpeed(fan)).await
    }

    pub async fn set_swing(&self, swing: SwingState) -> Result<()> {
        self.request(ClimateRequest::SetSwing(swing)).await
    }

    /// Token forms for platforms that hand over plain strings. Unknown
    /// tokens are rejected before anything reaches the device task.
    pub async fn set_mode_name(&self, token: &str) -> Result<()> {
        self.set_mode(token.parse::<Mode>()?).await
    }

    pub async fn set_fan_speed_name(&self, token: &str) -> Result<()> {
        self.set_fan_speed(token.parse::<FanSpeed>()?).await
    }

    pub async fn set_swing_name(&self, token: &str) -> Result<()> {
        self.set_swing(token.parse::<SwingState>()?).await
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.request(ClimateRequest::TurnOn).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.request(ClimateRequest::TurnOff).await
    }

    pub async fn update_current_temperature(&self, value: f32) -> Result<()> {
        self.request(ClimateRequest::UpdateCurrentTemperature(value))
            .await
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(ClimateRequest::Stop).await
    }

    pub fn status(&self) -> ClimateStatus {
        self.status_receiver.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClimateStatus> {
        self.status_receiver.clone()
    }

    pub fn status_stream(&self) -> WatchStream<ClimateStatus> {
        WatchStream::new(self.status_receiver.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio_stream::StreamExt;

    use super::*;
    use crate::ir::output::{self, TransmitError};
    use crate::ir::types::IrPacket;

    #[derive(Clone, Default)]
    struct FakeOut {
        sent: Arc<Mutex<Vec<IrPacket>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl FakeOut {
        fn sent(&self) -> Vec<IrPacket> {
            self.sent.lock().unwrap().clone()
        }

        fn fail_next(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl Transmit for FakeOut {
        async fn transmit(&mut self, packet: IrPacket) -> output::Result<()> {
            if *self.fail.lock().unwrap() {
                return Err(TransmitError::Timeout);
            }
            self.sent.lock().unwrap().push(packet);
            Ok(())
        }
    }

    fn packet_for(state: &Gree) -> IrPacket {
        gree_packet(state.frame())
    }

    #[tokio::test]
    async fn turn_on_after_off_lands_in_cool() {
        let out = FakeOut::default();
        let mut climate = Climate::new("ac", false, out.clone());
        climate.set_mode(Mode::Heat).await.unwrap();
        climate.turn_off().await.unwrap();
        climate.turn_on().await.unwrap();

        assert_eq!(climate.status().mode, Mode::Cool);
        let expected = Gree {
            mode: Mode::Cool,
            ..Gree::new(false)
        };
        assert_eq!(out.sent().last().unwrap(), &packet_for(&expected));
        // byte 3 of the frame carries the cool code
        assert_eq!(expected.frame().as_ref()[3], 0x02);
    }

    #[tokio::test]
    async fn repeated_temperature_still_dispatches() {
        let out = FakeOut::default();
        let mut climate = Climate::new("ac", false, out.clone());
        climate.set_temperature(24.0).await.unwrap();
        climate.set_temperature(24.0).await.unwrap();
        assert_eq!(out.sent().len(), 2);
        assert_eq!(out.sent()[0], out.sent()[1]);
    }

    #[tokio::test]
    async fn out_of_range_temperature_is_clamped_before_encoding() {
        let out = FakeOut::default();
        let mut climate = Climate::new("ac", false, out.clone());
        climate.set_temperature(99.0).await.unwrap();
        assert_eq!(climate.status().target_temperature, 30);
        let frame = out.sent()[0].clone();
        let expected = Gree {
            temperature: Celsius::clamped(30.0),
            ..Gree::new(false)
        };
        assert_eq!(frame, packet_for(&expected));
    }

    #[tokio::test]
    async fn swing_without_capability_is_refused_untouched() {
        let out = FakeOut::default();
        let mut climate = Climate::new("ac", false, out.clone());
        match climate.set_swing(SwingState::Both).await {
            Err(ClimateError::CapabilityUnsupported) => {}
            other => panic!("expected capability error, got {:?}", other),
        }
        assert!(out.sent().is_empty());
        assert_eq!(climate.status().swing, None);
    }

    #[tokio::test]
    async fn unknown_fan_token_changes_nothing() {
        let out = FakeOut::default();
        let mut climate = Climate::new("ac", false, out.clone());
        climate.set_mode(Mode::Cool).await.unwrap();
        let before = climate.state.frame();

        match climate.set_fan_speed_name("turbo").await {
            Err(ClimateError::InvalidArgument(_)) => {}
            other => panic!("expected invalid argument, got {:?}", other),
        }
        assert_eq!(climate.state.frame(), before);
        assert_eq!(out.sent().len(), 1);
    }

    #[tokio::test]
    async fn failed_dispatch_keeps_the_mutated_state() {
        let out = FakeOut::default();
        let mut climate = Climate::new("ac", false, out.clone());
        out.fail_next(true);
        match climate.set_mode(Mode::Dry).await {
            Err(ClimateError::Transmit(TransmitError::Timeout)) => {}
            other => panic!("expected transmit error, got {:?}", other),
        }
        // intent is authoritative: the mode stuck even though delivery failed
        assert_eq!(climate.status().mode, Mode::Dry);

        out.fail_next(false);
        climate.set_temperature(20.0).await.unwrap();
        assert_eq!(out.sent().len(), 1);
    }

    #[tokio::test]
    async fn startup_sync_ignores_in_memory_state() {
        let out = FakeOut::default();
        let mut climate = Climate::new("ac", true, out.clone());
        climate.set_mode(Mode::Heat).await.unwrap();
        climate.set_temperature(28.0).await.unwrap();

        climate.sync_startup().await.unwrap();
        assert_eq!(out.sent().last().unwrap(), &packet_for(&Gree::new(true)));
        // the desired state itself is untouched
        assert_eq!(climate.status().mode, Mode::Heat);
        assert_eq!(climate.status().target_temperature, 28);
    }

    #[tokio::test]
    async fn spawned_task_serializes_in_arrival_order() {
        let out = FakeOut::default();
        let handle = Climate::new("ac", true, out.clone()).spawn();

        handle.set_mode(Mode::Cool).await.unwrap();
        handle.set_temperature(22.0).await.unwrap();
        handle.set_fan_speed(FanSpeed::Min).await.unwrap();
        handle.set_swing(SwingState::Vertical).await.unwrap();

        let mut expected = Gree::new(true);
        let mut want = vec![packet_for(&expected)]; // startup sync
        expected.mode = Mode::Cool;
        want.push(packet_for(&expected));
        expected.temperature = Celsius::clamped(22.0);
        want.push(packet_for(&expected));
        expected.fan = FanSpeed::Min;
        want.push(packet_for(&expected));
        expected.swing = Some(SwingState::Vertical);
        want.push(packet_for(&expected));

        assert_eq!(out.sent(), want);

        let status = handle.status();
        assert_eq!(status.mode, Mode::Cool);
        assert_eq!(status.target_temperature, 22);
        assert_eq!(status.fan, FanSpeed::Min);
        assert_eq!(status.swing, Some(SwingState::Vertical));

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn status_changes_are_broadcast() {
        let out = FakeOut::default();
        let handle = Climate::new("ac", false, out.clone()).spawn();
        let mut statuses = handle.status_stream();
        // current value first
        statuses.next().await.unwrap();

        handle.update_current_temperature(21.5).await.unwrap();
        let status = statuses.next().await.unwrap();
        assert_eq!(status.current_temperature, Some(21.5));
        // sensor mirroring never dispatches a command
        assert!(out.sent().is_empty());

        handle.stop().await.unwrap();
    }
}
