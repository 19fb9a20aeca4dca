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
    pwm::{Pca9685, Pca9685Config},
    servo::{SERVO_COUNT, SERVO_FREQ_HZ, servos},
};
use {defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c::Config::default());
    let mut pca = Pca9685::new(i2c, Delay, Pca9685Config::default())?;
    pca.set_frequency(SERVO_FREQ_HZ)?;
    let mut servos = servos! { pwm: &mut pca };

    for servo in 1..=SERVO_COUNT {
        servos.center(servo)?;
    }
    Timer::after_millis(1_000).await;

    loop {
        // Sweep S1 by 10 degrees. Include 180 degrees.
        for angle in (0..=180).step_by(10) {
            servos.set_angle(1, angle)?;
            Timer::after_millis(150).await;
        }
        for angle in (0..=180).rev().step_by(10) {
            servos.set_angle(1, angle)?;
            Timer::after_millis(150).await;
        }
        info!("sweep done, resting S1");
        servos.release(1)?;
        Timer::after_millis(2_000).await;
    }
}
