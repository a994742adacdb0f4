mod grouping_avg;
