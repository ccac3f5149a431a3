use crate::backtracking::Assignment;
use crate::crossword::Crossword;

/// Place each assigned word's letters in the grid; unfilled and blocked cells are `None`.
pub fn letter_grid(crossword: &Crossword, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; crossword.width]; crossword.height];

    for (variable, word) in assignment {
        for ((row, col), c) in variable.cell_coords().into_iter().zip(word.chars()) {
            if let Some(cell) = letters.get_mut(row).and_then(|line| line.get_mut(col)) {
                *cell = Some(c);
            }
        }
    }

    letters
}

/// Turn the crossword and an assignment into a rendered string, one line per row, with `█` for
/// blocks and a space for any fillable cell the assignment leaves empty.
pub fn render_grid(crossword: &Crossword, assignment: &Assignment) -> String {
    let letters = letter_grid(crossword, assignment);

    crossword.structure.iter().zip(&letters).map(|(structure_row, letter_row)| {
        structure_row.iter().zip(letter_row).map(|(&fillable, &letter)| {
            if fillable { letter.unwrap_or(' ') } else { '█' }
        }).collect::<String>()
    }).collect::<Vec<_>>().join("\n")
}
