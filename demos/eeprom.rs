use std::env;
use std::fs::{self, File};

use xbkit::Result;
use xbkit::formats::eeprom::Eeprom;

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "eeprom.bin".into());
    let output = args.next();

    let mut eeprom = Eeprom::parse(&mut File::open(&input)?)?;

    println!("key generation: {}", eeprom.key_generation);
    println!("serial number:  {}", eeprom.factory.serial_number_str());
    println!("hdd key:        {:02X?}", eeprom.encrypted.hdd_key);
    println!("game region:    {:08X}", eeprom.encrypted.game_region);
    println!(
        "checksums:      factory {}, user {}",
        eeprom.factory.is_checksum_valid(),
        eeprom.user.is_checksum_valid()
    );

    if let Some(output) = output {
        eeprom.update_checksums();
        fs::write(&output, eeprom.to_bytes())?;
        println!("wrote {output}");
    }

    Ok(())
}
