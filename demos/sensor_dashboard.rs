#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::cell::RefCell;
use core::{convert::Infallible, panic};
use defmt::info;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::{Delay, Timer};
use embedded_hal_bus::i2c::RefCellDevice;
use ponybot_envoy::{
    Result,
    color::{COLOR_THRESHOLD_DEFAULT, Color, ColorSensor},
    motor::{Direction, MOTOR_FREQ_HZ_DEFAULT, Motors},
    oled::Oled,
    pwm::{self, Pca9685, Pca9685Config},
    servo::{ServoCalibration, Servos},
    sonar::Sonar,
};
use {defmt_rtt as _, panic_probe as _};

const OBSTACLE_CM: u16 = 15;

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    // PCA9685, OLED, and color sensor all hang off I2C0.
    let bus = RefCell::new(I2c::new_blocking(
        p.I2C0,
        p.PIN_5,
        p.PIN_4,
        i2c::Config::default(),
    ));
    let mut oled = Oled::new(RefCellDevice::new(&bus))?;
    let mut color = ColorSensor::new(RefCellDevice::new(&bus));
    let mut sonar = Sonar::new(
        Output::new(p.PIN_13, Level::Low),
        Input::new(p.PIN_14, Pull::None),
        Delay,
    );

    // Motors want 1000 Hz, so the servo on S1 only gets a rough pointer position.
    let mut pca = Pca9685::new(RefCellDevice::new(&bus), Delay, Pca9685Config::default())?;
    pca.set_frequency(MOTOR_FREQ_HZ_DEFAULT)?;
    let shared = pwm::share::<NoopRawMutex, _, _>(pca);
    let mut motors = Motors::new(&shared);
    let mut servos = Servos::new(&shared, ServoCalibration::default());

    oled.write_line(0, "PonyBot dashboard");
    oled.show()?;

    loop {
        let distance = sonar.measure_cm()?;
        let [red, green, blue] = color.rgb()?;
        let on_red = color.is_color(Color::Red, COLOR_THRESHOLD_DEFAULT)?;

        let blocked = distance.is_some_and(|cm| cm < OBSTACLE_CM);
        if blocked || on_red {
            motors.stop()?;
        } else {
            motors.drive(Direction::Forward, 35)?;
        }
        servos.set_angle(1, if blocked { 0 } else { 90 })?;

        oled.clear()?;
        oled.write_line(0, "PonyBot dashboard");
        match distance {
            Some(cm) => oled.write_line_fmt(2, format_args!("dist {cm} cm")),
            None => oled.write_line(2, "dist --"),
        }
        oled.write_line_fmt(3, format_args!("rgb {red} {green} {blue}"));
        oled.write_line_colored(5, if on_red { "RED: stopped" } else { "driving" }, !on_red);
        oled.show()?;
        info!("distance={} rgb=[{}, {}, {}]", distance, red, green, blue);

        Timer::after_millis(200).await;
    }
}
