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
    motor::{Direction, MOTOR_FREQ_HZ_DEFAULT, Motors},
    pwm::{Pca9685, Pca9685Config},
};
use {defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    // PonyBot header: SDA on GPIO 4, SCL on GPIO 5
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c::Config::default());
    let mut pca = Pca9685::new(i2c, Delay, Pca9685Config::default())?;
    pca.set_frequency(MOTOR_FREQ_HZ_DEFAULT)?;
    let mut motors = Motors::new(&mut pca);

    // Each motor alone, forward then back, so wiring mistakes are easy to spot.
    for motor in 1..=4 {
        info!("motor {}", motor);
        motors.set_speed(motor, 40)?;
        Timer::after_millis(500).await;
        motors.set_speed(motor, -40)?;
        Timer::after_millis(500).await;
        motors.set_speed(motor, 0)?;
    }

    let route = [
        (Direction::Forward, 60, 2_000),
        (Direction::Left, 50, 800),
        (Direction::Forward, 60, 2_000),
        (Direction::Right, 50, 800),
        (Direction::Backward, 40, 1_500),
        (Direction::Stop, 0, 1_000),
    ];
    loop {
        for (direction, speed, millis) in route {
            info!("{} at {}%", direction, speed);
            motors.drive(direction, speed)?;
            Timer::after_millis(millis).await;
        }
    }
}
