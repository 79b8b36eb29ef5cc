extern crate pretty_env_logger;
#[macro_use]
extern crate log;

use std::net::SocketAddr;

use eyre::eyre;
use structopt::StructOpt;

use gree_home::climate::types::TransmitTarget;
use gree_home::climate::{Climate, ClimateError};
use gree_home::ir::gree::types::{Celsius, FanSpeed, Mode, SwingState};
use gree_home::ir::gree::{gree_packet, Gree};
use gree_home::ir::output::Transmit;

#[derive(StructOpt, Debug)]
struct AcState {
    /// Leave the unit powered off
    #[structopt(short, long)]
    unpowered: bool,

    /// Operating mode
    #[structopt(short, long, default_value = "cool")]
    mode: Mode,

    /// Target temperature in celsius
    #[structopt(short, long, default_value = "24")]
    temperature: Celsius,

    /// Fan speed
    #[structopt(short, long, default_value = "auto")]
    fan: FanSpeed,

    /// Swing position, implies the unit supports swing
    #[structopt(short, long)]
    swing: Option<SwingState>,
}

impl AcState {
    fn to_gree(&self) -> Gree {
        Gree {
            mode: if self.unpowered { Mode::Off } else { self.mode },
            temperature: self.temperature,
            fan: self.fan,
            swing: self.swing,
        }
    }

    async fn apply<T: Transmit>(&self, climate: &mut Climate<T>) -> Result<(), ClimateError> {
        climate
            .set_temperature(f64::from(u8::from(self.temperature)))
            .await?;
        climate.set_fan_speed(self.fan).await?;
        if let Some(swing) = self.swing {
            climate.set_swing(swing).await?;
        }
        if self.unpowered {
            climate.turn_off().await
        } else {
            climate.set_mode(self.mode).await
        }
    }
}

#[derive(StructOpt, Debug)]
struct TargetOpt {
    /// Address of a network IR blaster
    #[structopt(long)]
    blaster: Option<SocketAddr>,

    /// Base url of the home automation api
    #[structopt(long)]
    api_base: Option<String>,

    /// Remote entity to forward commands through
    #[structopt(long)]
    entity_id: Option<String>,

    /// Api access token for the remote entity
    #[structopt(long)]
    token: Option<String>,
}

impl TargetOpt {
    fn to_target(&self) -> eyre::Result<TransmitTarget> {
        match (&self.blaster, &self.api_base, &self.entity_id) {
            (Some(addr), None, None) => Ok(TransmitTarget::Blaster(*addr)),
            (None, Some(api_base), Some(entity_id)) => Ok(TransmitTarget::Remote {
                api_base: api_base.clone(),
                entity_id: entity_id.clone(),
                token: self.token.clone().unwrap_or_default(),
            }),
            _ => Err(eyre!("pass either --blaster or --api-base with --entity-id")),
        }
    }
}

#[derive(StructOpt, Debug)]
enum Opt {
    /// Print the command frame and encapsulated payload for a state
    Encode {
        #[structopt(flatten)]
        state: AcState,
    },
    /// Assert a full state on the unit
    Send {
        #[structopt(flatten)]
        target: TargetOpt,

        #[structopt(flatten)]
        state: AcState,

        /// Name used in logs
        #[structopt(short, long, default_value = "gree")]
        name: String,
    },
    /// Send the startup baseline command only
    Sync {
        #[structopt(flatten)]
        target: TargetOpt,

        /// The unit supports swing
        #[structopt(long)]
        swing_capable: bool,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;

    let opts = Opt::from_args();

    debug!("opts: {:?}", opts);

    match opts {
        Opt::Encode { state } => {
            let frame = state.to_gree().frame();
            let packet = gree_packet(frame);
            println!("Frame: {}", frame.to_string());
            println!("Payload: {}", packet.as_hex());
        }
        Opt::Send {
            target,
            state,
            name,
        } => {
            let out = target.to_target()?.connect().await?;
            let mut climate = Climate::new(name, state.swing.is_some(), out);
            state.apply(&mut climate).await?;
            println!("Asserted: {:?}", climate.status());
        }
        Opt::Sync {
            target,
            swing_capable,
        } => {
            let out = target.to_target()?.connect().await?;
            let mut climate = Climate::new("gree", swing_capable, out);
            climate.sync_startup().await?;
            println!("Synchronized to the off baseline");
        }
    }

    Ok(())
}
