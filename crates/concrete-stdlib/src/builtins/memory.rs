//! Reading and writing labelled cells through addresses

use concrete_core::ast::Block;
use concrete_core::vm::{Activation, Command, EngineError};

/// `block, address set!`
pub fn set(arguments: &[Block]) -> Result<Vec<Command>, EngineError> {
    match arguments {
        [block, address, ..] => Ok(vec![
            Command::PlaceBlockAtAddress {
                address: address.clone(),
                block: block.clone(),
            },
            Command::Done,
        ]),
        _ => Err(EngineError::executor(format!(
            "set! requires a block and an address, got {} argument(s)",
            arguments.len()
        ))),
    }
}

/// `block into! address`: the address is the block right after the op
pub fn into(arguments: &[Block], next_block: Option<&Block>) -> Result<Vec<Command>, EngineError> {
    let block = arguments
        .first()
        .ok_or_else(|| EngineError::executor("into! requires a block to store"))?;
    let address = next_block
        .ok_or_else(|| EngineError::executor("into! requires an address after it"))?;
    Ok(vec![
        Command::PlaceBlockAtAddress {
            address: address.clone(),
            block: block.clone(),
        },
        Command::Done,
    ])
}

/// `address get!` places the block stored at the address
pub fn get(arguments: &[Block]) -> Result<Box<dyn Activation>, EngineError> {
    let address = arguments
        .first()
        .cloned()
        .ok_or_else(|| EngineError::executor("get! requires an address"))?;
    Ok(Box::new(Get {
        address: Some(address),
    }))
}

struct Get {
    address: Option<Block>,
}

impl Activation for Get {
    fn resume(&mut self, response: Option<Block>) -> Result<Command, EngineError> {
        if let Some(address) = self.address.take() {
            return Ok(Command::RequestBlockAtAddress(address));
        }
        // The fetched block arrives once; the resume after placing it ends
        Ok(response.map_or(Command::Done, Command::PlaceResult))
    }
}
