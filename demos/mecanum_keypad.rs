#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};
use defmt::info;
use embassy_executor::Spawner;
use embassy_rp::i2c::{self, I2c};
use embassy_time::{Delay, Timer};
use ponybot_envoy::{
    Result,
    motor::{MOTOR_FREQ_HZ_DEFAULT, Motors},
    pwm::{Pca9685, Pca9685Config},
};
use {defmt_rtt as _, panic_probe as _};

// Trace a square, then the diagonals, then rest:
//   7 8 9
//   4 5 6
//   1 2 3
const KEYPAD_TOUR: [u8; 9] = [8, 6, 2, 4, 9, 1, 7, 3, 5];

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c::Config::default());
    let mut pca = Pca9685::new(i2c, Delay, Pca9685Config::default())?;
    pca.set_frequency(MOTOR_FREQ_HZ_DEFAULT)?;
    let mut motors = Motors::new(&mut pca);

    loop {
        for code in KEYPAD_TOUR {
            info!("keypad {}", code);
            motors.mecanum(code, 45)?;
            Timer::after_millis(1_200).await;
            motors.stop()?;
            Timer::after_millis(300).await;
        }
    }
}
