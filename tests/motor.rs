#![allow(missing_docs)]
//! Host-level tests for motor speed, skid-steer, and mecanum mapping.

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use ponybot_envoy::motor::{Direction, MotorChannelMap, Motors, speed_to_duty};
use ponybot_envoy::pwm::{Channel, Pca9685, Pca9685Config, SetDuty};
use ponybot_envoy::{Error, Result};

/// Records every duty write as `(channel, value)`.
#[derive(Default)]
struct RecordingPwm {
    writes: Vec<(u8, u16)>,
}

impl SetDuty for RecordingPwm {
    fn set_duty(&mut self, channel: Channel, value: u16) -> Result<()> {
        self.writes.push((channel.index(), value));
        Ok(())
    }
}

#[test]
fn positive_speed_drives_forward_channel() -> Result<()> {
    let mut pwm = RecordingPwm::default();
    let mut motors = Motors::new(&mut pwm);

    motors.set_speed(1, 50)?;
    motors.set_speed(1, -50)?;
    motors.set_speed(3, 0)?;

    assert_eq!(
        pwm.writes,
        [(7, 2_048), (6, 0), (7, 0), (6, 2_048), (2, 0), (3, 0)]
    );
    Ok(())
}

#[test]
fn speed_is_clamped_to_full_duty() -> Result<()> {
    let mut pwm = RecordingPwm::default();
    let mut motors = Motors::new(&mut pwm);

    motors.set_speed(2, 150)?;
    motors.set_speed(2, i16::MIN)?;

    assert_eq!(pwm.writes, [(5, 4_095), (4, 0), (5, 0), (4, 4_095)]);
    Ok(())
}

#[test]
fn exactly_one_channel_runs_for_every_speed() -> Result<()> {
    for speed in -100_i16..=100 {
        let mut pwm = RecordingPwm::default();
        Motors::new(&mut pwm).set_speed(4, speed)?;

        let expected = speed_to_duty(speed);
        let &[(forward_channel, forward), (reverse_channel, reverse)] = pwm.writes.as_slice()
        else {
            panic!("speed {speed} wrote {:?}", pwm.writes);
        };
        assert_eq!((forward_channel, reverse_channel), (0, 1));
        match speed.signum() {
            1 => assert_eq!((forward, reverse), (expected, 0), "speed {speed}"),
            -1 => assert_eq!((forward, reverse), (0, expected), "speed {speed}"),
            _ => assert_eq!((forward, reverse), (0, 0)),
        }
    }
    Ok(())
}

#[test]
fn unknown_motor_writes_nothing() {
    let mut pwm = RecordingPwm::default();
    let mut motors = Motors::new(&mut pwm);

    assert_eq!(motors.set_speed(5, 10), Err(Error::UnknownMotor { motor: 5 }));
    assert_eq!(motors.set_speed(0, 10), Err(Error::UnknownMotor { motor: 0 }));
    assert!(pwm.writes.is_empty());
}

#[test]
fn drive_left_spins_left_side_forward() -> Result<()> {
    let mut pwm = RecordingPwm::default();
    let mut motors = Motors::new(&mut pwm);

    motors.drive(Direction::Left, 60)?;

    assert_eq!(
        pwm.writes,
        [
            (7, 2_457),
            (6, 0),
            (5, 2_457),
            (4, 0),
            (2, 0),
            (3, 2_457),
            (0, 0),
            (1, 2_457),
        ]
    );
    Ok(())
}

#[test]
fn drive_accepts_parsed_direction_names() -> Result<()> {
    let mut pwm = RecordingPwm::default();
    let mut motors = Motors::new(&mut pwm);

    motors.drive("backward".parse()?, 100)?;
    assert_eq!("up".parse::<Direction>(), Err(Error::InvalidDirection));

    assert_eq!(
        pwm.writes,
        [
            (7, 0),
            (6, 4_095),
            (5, 0),
            (4, 4_095),
            (2, 0),
            (3, 4_095),
            (0, 0),
            (1, 4_095),
        ]
    );
    Ok(())
}

#[test]
fn stop_turns_every_channel_off() -> Result<()> {
    let mut pwm = RecordingPwm::default();
    let mut motors = Motors::new(&mut pwm);

    motors.stop()?;

    assert_eq!(pwm.writes.len(), 8);
    assert!(pwm.writes.iter().all(|&(_, duty)| duty == 0));
    Ok(())
}

#[test]
fn mecanum_strafe_right_alternates_wheels() -> Result<()> {
    let mut pwm = RecordingPwm::default();
    let mut motors = Motors::new(&mut pwm);

    motors.mecanum(6, 50)?;

    assert_eq!(
        pwm.writes,
        [
            (7, 0),
            (6, 2_048),
            (5, 2_048),
            (4, 0),
            (2, 0),
            (3, 2_048),
            (0, 2_048),
            (1, 0),
        ]
    );
    Ok(())
}

#[test]
fn invalid_mecanum_code_writes_nothing() {
    let mut pwm = RecordingPwm::default();
    let mut motors = Motors::new(&mut pwm);

    assert_eq!(
        motors.mecanum(10, 10),
        Err(Error::InvalidDirectionCode { code: 10 })
    );
    assert_eq!(
        motors.mecanum(0, 10),
        Err(Error::InvalidDirectionCode { code: 0 })
    );
    assert!(pwm.writes.is_empty());
}

#[test]
fn custom_channel_map_is_honored() -> Result<()> {
    let map = MotorChannelMap::new([
        (Channel::new(0)?, Channel::new(1)?),
        (Channel::new(2)?, Channel::new(3)?),
        (Channel::new(4)?, Channel::new(5)?),
        (Channel::new(6)?, Channel::new(7)?),
    ]);
    let mut pwm = RecordingPwm::default();
    let mut motors = Motors::with_channels(&mut pwm, map);

    motors.set_speed(3, -100)?;

    assert_eq!(pwm.writes, [(4, 0), (5, 4_095)]);
    Ok(())
}

#[test]
fn full_speed_reaches_the_chip_as_full_on() -> Result<()> {
    let write = |register: u8, value: u8| I2cTransaction::write(0x40, vec![register, value]);
    let mut expectations = vec![
        write(0x00, 0x00),
        write(0xFA, 0x00),
        write(0xFB, 0x00),
        write(0xFC, 0x00),
        write(0xFD, 0x00),
        write(0x00, 0x04),
        write(0x00, 0x01),
        I2cTransaction::write_read(0x40, vec![0x00], vec![0x01]),
        write(0x00, 0x01),
    ];
    // Motor 1: channel 7 full on, channel 6 full off.
    expectations.extend([
        write(0x22, 0x00),
        write(0x23, 0x10),
        write(0x24, 0x00),
        write(0x25, 0x00),
        write(0x1E, 0x00),
        write(0x1F, 0x00),
        write(0x20, 0x00),
        write(0x21, 0x10),
    ]);
    let mut i2c = I2cMock::new(&expectations);

    let mut pca = Pca9685::new(i2c.clone(), NoopDelay, Pca9685Config::default())?;
    Motors::new(&mut pca).set_speed(1, 100)?;
    drop(pca);

    i2c.done();
    Ok(())
}
