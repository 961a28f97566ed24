pub mod completions;
pub mod move_cmd;
pub mod replay;
pub mod show;
pub mod sim;

use std::path::Path;

use autoflow_core::Board;
use autoflow_core::error::{BoardError, ErrorCode};

use crate::output::{CliError, OutputMode, render_error};

/// Report a board error on stderr in the active output mode and turn it into
/// the command's failure.
pub fn fail_board(output: OutputMode, err: BoardError) -> anyhow::Error {
    let rendered = render_error(output, &CliError::from_code(err.code(), err.to_string()));
    if let Err(render_err) = rendered {
        return render_err.context(err);
    }
    anyhow::Error::new(err)
}

/// Load a board file, rendering a coded error on failure.
pub fn load_board(path: &Path, output: OutputMode) -> anyhow::Result<Board> {
    Board::load_json(path).map_err(|err| fail_board(output, err))
}

/// Persist a board file, rendering a coded error on failure.
pub fn save_board(board: &Board, path: &Path, output: OutputMode) -> anyhow::Result<()> {
    board.save_json(path).map_err(|err| fail_board(output, err))
}

/// Report an unreadable or invalid config file. The summary line comes from
/// the code, the detail from the error chain.
pub fn fail_config(output: OutputMode, err: anyhow::Error) -> anyhow::Error {
    let code = ErrorCode::ConfigParseError;
    let message = format!("{}: {err:#}", code.message());
    if let Err(render_err) = render_error(output, &CliError::from_code(code, message)) {
        return render_err.context(err);
    }
    err
}

/// Report a coded failure that did not come from a [`BoardError`].
pub fn fail_code(output: OutputMode, code: ErrorCode, message: String) -> anyhow::Error {
    if let Err(render_err) = render_error(output, &CliError::from_code(code, message.clone())) {
        return render_err;
    }
    anyhow::anyhow!(message)
}
